//! How seize/release and delay stations find their configuration for one
//! entity.

use std::fmt;

use des_core::{EntityId, StationId, ValueSource};
use des_entity::{Entity, EntityType};
use des_resource::{ReleaseRequirement, SeizeRequirement, Sequenced, sort_requirements};

use crate::{StationError, StationResult};

/// A requirement kind that entities and entity types can carry per station.
pub trait StationRequirement: Clone + Sequenced {
    fn carried_by_entity(entity: &Entity, station: StationId) -> &[Self];
    fn declared_by_type(ty: &EntityType, station: StationId) -> &[Self];
}

impl StationRequirement for SeizeRequirement {
    fn carried_by_entity(entity: &Entity, station: StationId) -> &[Self] {
        entity.seize_requirements(station)
    }

    fn declared_by_type(ty: &EntityType, station: StationId) -> &[Self] {
        ty.seize_requirements(station)
    }
}

impl StationRequirement for ReleaseRequirement {
    fn carried_by_entity(entity: &Entity, station: StationId) -> &[Self] {
        entity.release_requirements(station)
    }

    fn declared_by_type(ty: &EntityType, station: StationId) -> &[Self] {
        ty.release_requirements(station)
    }
}

/// Where a seize or release station gets its requirement list.
#[derive(Clone, Debug)]
pub enum RequirementOption<R> {
    /// The station's own list.
    Direct(Vec<R>),
    /// Whatever the entity's type declares for this station.
    ByType,
    /// Whatever the entity itself carries for this station.
    ByEntity,
}

impl<R> Default for RequirementOption<R> {
    fn default() -> Self {
        RequirementOption::Direct(Vec::new())
    }
}

impl<R: StationRequirement> RequirementOption<R> {
    pub fn label(&self) -> &'static str {
        match self {
            RequirementOption::Direct(_) => "direct",
            RequirementOption::ByType => "by type",
            RequirementOption::ByEntity => "by entity",
        }
    }

    /// The requirements that apply to `entity` at `station`, in service
    /// order.  An empty resolution is a missing-configuration error.
    pub fn resolve(
        &self,
        station: StationId,
        entity:  &Entity,
        ty:      &EntityType,
    ) -> StationResult<Vec<R>> {
        let found: &[R] = match self {
            RequirementOption::Direct(list) => list,
            RequirementOption::ByType => R::declared_by_type(ty, station),
            RequirementOption::ByEntity => R::carried_by_entity(entity, station),
        };
        if found.is_empty() {
            return Err(StationError::NoRequirements {
                station,
                entity: entity.id(),
                option: self.label(),
            });
        }
        let mut list = found.to_vec();
        sort_requirements(&mut list)?;
        Ok(list)
    }

    /// Append to the station's own list.
    pub fn push(&mut self, station: StationId, requirement: R) -> StationResult<()> {
        match self {
            RequirementOption::Direct(list) => {
                list.push(requirement);
                Ok(())
            }
            other => Err(StationError::NotDirect { station, option: other.label() }),
        }
    }
}

/// Where a delay station gets its durations.
pub enum DelayOption {
    Direct(Box<dyn ValueSource>),
    /// The entity type's duration source for this station.
    ByType,
}

impl DelayOption {
    /// Draw the next duration for `entity`.
    pub fn sample(
        &mut self,
        station: StationId,
        entity:  EntityId,
        ty:      &mut EntityType,
    ) -> StationResult<f64> {
        let value = match self {
            DelayOption::Direct(source) => source.next_value(),
            DelayOption::ByType => ty
                .sample_delay(station)
                .ok_or(StationError::NoDelaySource { station, entity })?,
        };
        if value < 0.0 || value.is_nan() {
            return Err(StationError::NegativeDelay { station, value });
        }
        Ok(value)
    }
}

impl fmt::Debug for DelayOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DelayOption::Direct(_) => f.write_str("Direct"),
            DelayOption::ByType => f.write_str("ByType"),
        }
    }
}
