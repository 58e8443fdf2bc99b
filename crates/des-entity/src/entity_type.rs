//! Per-type routing, requirements and delays.

use std::fmt;

use rustc_hash::FxHashMap;

use des_core::{EntityTypeId, StationId, ValueSource};
use des_resource::{ReleaseRequirement, SeizeRequirement};

/// Shared configuration of all entities of one kind.
///
/// Stations configured `ByType` look their requirements, delay and next
/// station up here, keyed by their own [`StationId`].
pub struct EntityType {
    pub(crate) id:   EntityTypeId,
    pub(crate) name: String,
    sequence:        Vec<StationId>,
    routes:          FxHashMap<StationId, StationId>,
    seize:           FxHashMap<StationId, Vec<SeizeRequirement>>,
    release:         FxHashMap<StationId, Vec<ReleaseRequirement>>,
    delays:          FxHashMap<StationId, Box<dyn ValueSource>>,
}

impl EntityType {
    pub(crate) fn new(id: EntityTypeId, name: String) -> Self {
        Self {
            id,
            name,
            sequence: Vec::new(),
            routes: FxHashMap::default(),
            seize: FxHashMap::default(),
            release: FxHashMap::default(),
            delays: FxHashMap::default(),
        }
    }

    pub fn id(&self) -> EntityTypeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Station visiting order for `BySequence` routing.
    pub fn set_sequence(&mut self, stations: Vec<StationId>) {
        self.sequence = stations;
    }

    pub fn sequence(&self) -> &[StationId] {
        &self.sequence
    }

    /// Route entities of this type leaving `from` to `to` (`ByType` routing).
    pub fn add_route(&mut self, from: StationId, to: StationId) {
        self.routes.insert(from, to);
    }

    pub fn route(&self, from: StationId) -> Option<StationId> {
        self.routes.get(&from).copied()
    }

    pub fn add_seize_requirement(&mut self, station: StationId, requirement: SeizeRequirement) {
        self.seize.entry(station).or_default().push(requirement);
    }

    pub fn add_release_requirement(&mut self, station: StationId, requirement: ReleaseRequirement) {
        self.release.entry(station).or_default().push(requirement);
    }

    pub fn seize_requirements(&self, station: StationId) -> &[SeizeRequirement] {
        self.seize.get(&station).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn release_requirements(&self, station: StationId) -> &[ReleaseRequirement] {
        self.release.get(&station).map(Vec::as_slice).unwrap_or_default()
    }

    /// Duration source used by `station` when its delay is `ByType`.
    pub fn set_delay(&mut self, station: StationId, source: Box<dyn ValueSource>) {
        self.delays.insert(station, source);
    }

    pub fn has_delay(&self, station: StationId) -> bool {
        self.delays.contains_key(&station)
    }

    /// Draw the next duration for `station`, if a source is configured.
    pub fn sample_delay(&mut self, station: StationId) -> Option<f64> {
        self.delays.get_mut(&station).map(|s| s.next_value())
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityType")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("sequence", &self.sequence)
            .field("routes", &self.routes.len())
            .field("delays", &self.delays.len())
            .finish()
    }
}
