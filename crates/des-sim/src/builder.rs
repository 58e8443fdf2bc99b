//! Builder for constructing a [`Model`].

use std::path::Path;
use std::sync::Arc;

use tracing::debug;

use des_core::{
    EntityTypeId, IdGenerator, ModelConfig, ResourceId, ResourceSetId, SimRng, StationId,
};
use des_entity::{Discipline, EntityType};
use des_resource::{
    ReleaseRequirement, ResourceSpec, SeizeRequirement, SelectionRule, load_resources_csv,
};
use des_station::{
    DelayOption, Generator, RequirementOption, SendMode, Station, StationError, StationKind,
};

use crate::{Model, SimError, SimResult};

/// Builder for [`Model`].
///
/// Registration methods take `&mut self` and hand back the new id, since
/// later registrations (sets, requirements, routing) refer to earlier ones.
/// [`build`][Self::build] validates the wiring and returns the model.
///
/// # Example
///
/// ```rust,ignore
/// let mut b = ModelBuilder::new(ModelConfig::default());
/// let nurse = b.add_resource("nurse", 2)?;
/// let patient = b.add_entity_type("patient")?;
/// let need = SeizeRequirement::resource(nurse, 1).build(b.ids())?;
/// let seize = b.add_seize_station("see nurse", Discipline::Fifo, RequirementOption::Direct(vec![need]))?;
/// let out = b.add_dispose_station("out")?;
/// b.set_direct_receiver(seize, out)?;
/// let mut model = b.build()?;
/// ```
pub struct ModelBuilder {
    model: Model,
}

impl ModelBuilder {
    pub fn new(config: ModelConfig) -> Self {
        Self { model: Model::new(config) }
    }

    /// Requirement ids and sequence numbers for this model.
    pub fn ids(&mut self) -> &mut IdGenerator {
        &mut self.model.ids
    }

    /// An independent random stream for a value source.
    pub fn stream(&mut self, offset: u64) -> SimRng {
        self.model.rng.child(offset)
    }

    // ── Resources ─────────────────────────────────────────────────────────

    pub fn add_resource(&mut self, name: impl Into<String>, capacity: u32) -> SimResult<ResourceId> {
        Ok(self.model.resources.add_resource(name, capacity)?)
    }

    pub fn add_resource_set(&mut self, name: impl Into<String>, members: &[ResourceId]) -> SimResult<ResourceSetId> {
        Ok(self.model.resources.add_resource_set(name, members)?)
    }

    pub fn add_resource_set_with_rule(
        &mut self,
        name:    impl Into<String>,
        members: &[ResourceId],
        rule:    Arc<dyn SelectionRule>,
    ) -> SimResult<ResourceSetId> {
        Ok(self.model.resources.add_resource_set_with_rule(name, members, rule)?)
    }

    /// Register resources (and their sets) from specs.
    pub fn load_resources(&mut self, specs: &[ResourceSpec]) -> SimResult<()> {
        Ok(self.model.resources.load_specs(specs)?)
    }

    /// Register resources from a `name,capacity[,set]` CSV file.
    pub fn load_resources_csv(&mut self, path: &Path) -> SimResult<()> {
        let specs = load_resources_csv(path)?;
        self.load_resources(&specs)
    }

    pub fn resource_id(&self, name: &str) -> Option<ResourceId> {
        self.model.resources.resource_id(name)
    }

    pub fn resource_set_id(&self, name: &str) -> Option<ResourceSetId> {
        self.model.resources.resource_set_id(name)
    }

    // ── Entity types ──────────────────────────────────────────────────────

    pub fn add_entity_type(&mut self, name: impl Into<String>) -> SimResult<EntityTypeId> {
        Ok(self.model.entities.add_type(name)?)
    }

    /// Configure sequences, routes, requirements and delays of a type.
    pub fn entity_type_mut(&mut self, id: EntityTypeId) -> SimResult<&mut EntityType> {
        Ok(self.model.entities.entity_type_mut(id)?)
    }

    // ── Stations ──────────────────────────────────────────────────────────

    fn push_station(&mut self, name: impl Into<String>, kind: StationKind) -> SimResult<StationId> {
        let name = name.into();
        if self.model.stations.iter().any(|s| s.name() == name) {
            return Err(StationError::DuplicateName(name).into());
        }
        let id = StationId(self.model.stations.len() as u32);
        debug!(%id, %name, kind = kind.label(), "station added");
        self.model.stations.push(Station::new(id, name, kind));
        Ok(id)
    }

    /// A seize station with its own waiting queue named `"{name} queue"`.
    pub fn add_seize_station(
        &mut self,
        name:         impl Into<String>,
        discipline:   Discipline,
        requirements: RequirementOption<SeizeRequirement>,
    ) -> SimResult<StationId> {
        let name = name.into();
        let queue = self.model.entities.add_queue(format!("{name} queue"), discipline)?;
        self.push_station(name, StationKind::Seize { queue, requirements })
    }

    pub fn add_release_station(
        &mut self,
        name:         impl Into<String>,
        requirements: RequirementOption<ReleaseRequirement>,
    ) -> SimResult<StationId> {
        self.push_station(name, StationKind::Release { requirements })
    }

    pub fn add_delay_station(&mut self, name: impl Into<String>, delay: DelayOption) -> SimResult<StationId> {
        self.push_station(name, StationKind::Delay { delay })
    }

    pub fn add_dispose_station(&mut self, name: impl Into<String>) -> SimResult<StationId> {
        self.push_station(name, StationKind::Dispose)
    }

    pub fn add_generator(&mut self, name: impl Into<String>, generator: Generator) -> SimResult<StationId> {
        self.model.entities.entity_type(generator.entity_type())?;
        self.push_station(name, StationKind::Generator(generator))
    }

    /// Wire `members` into one composite station.
    ///
    /// Each member is sent on to the next, the last to a new exit station
    /// named `"{name} exit"`; the exit hands entities back to the composite,
    /// which routes them with its own send mode.
    pub fn add_composite(&mut self, name: impl Into<String>, members: &[StationId]) -> SimResult<StationId> {
        let name = name.into();
        if members.is_empty() {
            return Err(StationError::EmptyComposite(name).into());
        }
        for (i, &m) in members.iter().enumerate() {
            let st = self.model.station(m)?;
            if let Some(other) = st.composite() {
                return Err(StationError::CompositeMember { station: m, composite: other }.into());
            }
            if !st.receives_entities() {
                return Err(StationError::NotReceiving(m).into());
            }
            if members[..i].contains(&m) {
                return Err(SimError::Config(format!("{m} appears twice in composite {name:?}")));
            }
        }

        let composite = StationId(self.model.stations.len() as u32);
        let exit = StationId(composite.0 + 1);
        self.push_station(name.clone(), StationKind::Composite { members: members.to_vec(), exit })?;
        self.push_station(format!("{name} exit"), StationKind::Exit { composite })?;

        let next = members.iter().skip(1).copied().chain(std::iter::once(exit));
        for (&m, to) in members.iter().zip(next) {
            self.station_mut(m)?.wire_into_composite(composite, to);
        }
        Ok(composite)
    }

    pub fn station_mut(&mut self, id: StationId) -> SimResult<&mut Station> {
        self.model
            .stations
            .get_mut(id.index())
            .ok_or(SimError::Station(StationError::UnknownStation(id)))
    }

    pub fn add_seize_requirement(&mut self, station: StationId, requirement: SeizeRequirement) -> SimResult<()> {
        Ok(self.station_mut(station)?.add_seize_requirement(requirement)?)
    }

    pub fn add_release_requirement(&mut self, station: StationId, requirement: ReleaseRequirement) -> SimResult<()> {
        Ok(self.station_mut(station)?.add_release_requirement(requirement)?)
    }

    // ── Routing ───────────────────────────────────────────────────────────

    pub fn set_send_mode(&mut self, station: StationId, mode: SendMode) -> SimResult<()> {
        self.model.set_sending_option(station, mode)
    }

    pub fn set_direct_receiver(&mut self, station: StationId, to: StationId) -> SimResult<()> {
        self.model.set_direct_receiver(station, to)
    }

    // ── Build ─────────────────────────────────────────────────────────────

    /// Validate routing and return a ready-to-run [`Model`].
    ///
    /// Every station that forwards entities must have a send mode, and every
    /// direct destination must accept entities.
    pub fn build(self) -> SimResult<Model> {
        for st in &self.model.stations {
            let forwards = !matches!(st.kind(), StationKind::Dispose | StationKind::Exit { .. });
            match st.send_mode() {
                None if forwards => return Err(StationError::NoSendMode(st.id()).into()),
                Some(SendMode::Direct(to)) => {
                    if !self.model.station(*to)?.receives_entities() {
                        return Err(StationError::NotReceiving(*to).into());
                    }
                }
                _ => {}
            }
        }
        debug!(
            stations = self.model.stations.len(),
            resources = self.model.resources.resources().len(),
            "model built"
        );
        Ok(self.model)
    }
}
