//! Stations as tagged variants sharing one routing value.

use des_core::{Counter, EntityTypeId, ObservationSink, QueueId, StationId, Tally, ValueSource};
use des_entity::{Entity, EntityType};
use des_resource::{ReleaseRequirement, SeizeRequirement};

use crate::{DelayOption, RequirementOption, SendMode, StationError, StationResult};

// ── Generator ─────────────────────────────────────────────────────────────────

/// Arrival process of a generator station.
pub struct Generator {
    entity_type:   EntityTypeId,
    interarrival:  Box<dyn ValueSource>,
    first_arrival: Option<f64>,
    max_count:     Option<u64>,
    created:       u64,
}

impl Generator {
    pub fn new(entity_type: EntityTypeId, interarrival: Box<dyn ValueSource>) -> Self {
        Self { entity_type, interarrival, first_arrival: None, max_count: None, created: 0 }
    }

    /// Time of the first arrival; defaults to one interarrival draw.
    pub fn first_arrival(mut self, at: f64) -> Self {
        self.first_arrival = Some(at);
        self
    }

    /// Stop after this many arrivals.
    pub fn max_count(mut self, n: u64) -> Self {
        self.max_count = Some(n);
        self
    }

    pub fn entity_type(&self) -> EntityTypeId {
        self.entity_type
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub fn is_exhausted(&self) -> bool {
        self.max_count.is_some_and(|m| self.created >= m)
    }

    /// Delay from model start to the first arrival.
    pub fn first_delay(&mut self, station: StationId) -> StationResult<f64> {
        match self.first_arrival {
            Some(at) => checked(station, at),
            None => self.next_delay(station),
        }
    }

    /// Delay until the next arrival.
    pub fn next_delay(&mut self, station: StationId) -> StationResult<f64> {
        checked(station, self.interarrival.next_value())
    }

    pub fn record_creation(&mut self) {
        self.created += 1;
    }
}

fn checked(station: StationId, value: f64) -> StationResult<f64> {
    if value < 0.0 || value.is_nan() {
        return Err(StationError::NegativeDelay { station, value });
    }
    Ok(value)
}

// ── StationKind ───────────────────────────────────────────────────────────────

/// What a station does with an entity it receives.
pub enum StationKind {
    /// Queue the entity, then seize every resolved requirement; forward once
    /// all are granted.
    Seize {
        queue:        QueueId,
        requirements: RequirementOption<SeizeRequirement>,
    },
    /// Apply every resolved release, then forward.
    Release {
        requirements: RequirementOption<ReleaseRequirement>,
    },
    /// Hold the entity for a sampled duration, then forward.
    Delay { delay: DelayOption },
    /// An opaque chain: entities enter at the first member and leave through
    /// `exit`.
    Composite {
        members: Vec<StationId>,
        exit:    StationId,
    },
    /// The hand-off point of `composite`.
    Exit { composite: StationId },
    /// Terminal: the entity leaves the model.
    Dispose,
    /// Creates entities; never receives any.
    Generator(Generator),
}

impl StationKind {
    pub fn label(&self) -> &'static str {
        match self {
            StationKind::Seize { .. } => "seize",
            StationKind::Release { .. } => "release",
            StationKind::Delay { .. } => "delay",
            StationKind::Composite { .. } => "composite",
            StationKind::Exit { .. } => "exit",
            StationKind::Dispose => "dispose",
            StationKind::Generator(_) => "generator",
        }
    }
}

// ── StationStats ──────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Default)]
pub struct StationStats {
    received:        u64,
    sent:            u64,
    in_station:      Counter,
    time_in_station: Tally,
}

impl StationStats {
    pub fn received(&self) -> u64 {
        self.received
    }

    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Number of entities currently inside (current, min, max).
    pub fn in_station(&self) -> &Counter {
        &self.in_station
    }

    pub fn time_in_station(&self) -> &Tally {
        &self.time_in_station
    }

    pub fn record_arrival(&mut self) {
        self.received += 1;
        self.in_station.increment(1.0);
    }

    /// An entity left after `elapsed` time units.
    pub fn record_departure(&mut self, elapsed: f64) {
        self.sent += 1;
        self.in_station.decrement(1.0);
        self.time_in_station.observe(elapsed);
    }
}

// ── Station ───────────────────────────────────────────────────────────────────

pub struct Station {
    id:        StationId,
    name:      String,
    kind:      StationKind,
    send:      Option<SendMode>,
    /// Composite this station is wired into, if any.
    composite: Option<StationId>,
    stats:     StationStats,
}

impl Station {
    pub fn new(id: StationId, name: impl Into<String>, kind: StationKind) -> Self {
        Self { id, name: name.into(), kind, send: None, composite: None, stats: StationStats::default() }
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StationKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut StationKind {
        &mut self.kind
    }

    /// Generators are the only stations that refuse entities.
    pub fn receives_entities(&self) -> bool {
        !matches!(self.kind, StationKind::Generator(_))
    }

    pub fn stats(&self) -> &StationStats {
        &self.stats
    }

    pub fn stats_mut(&mut self) -> &mut StationStats {
        &mut self.stats
    }

    // ── Routing ───────────────────────────────────────────────────────────

    pub fn send_mode(&self) -> Option<&SendMode> {
        self.send.as_ref()
    }

    pub fn composite(&self) -> Option<StationId> {
        self.composite
    }

    /// Replace the active send mode.  Composite members keep the wiring
    /// their composite gave them.
    pub fn set_send_mode(&mut self, mode: SendMode) -> StationResult<()> {
        if let Some(composite) = self.composite {
            return Err(StationError::CompositeMember { station: self.id, composite });
        }
        self.send = Some(mode);
        Ok(())
    }

    /// Shorthand for `set_send_mode(SendMode::Direct(to))`.
    pub fn set_direct_receiver(&mut self, to: StationId) -> StationResult<()> {
        self.set_send_mode(SendMode::Direct(to))
    }

    /// Fix this station's destination as part of `composite`.
    pub fn wire_into_composite(&mut self, composite: StationId, next: StationId) {
        self.composite = Some(composite);
        self.send = Some(SendMode::Direct(next));
    }

    /// Resolve where `entity` goes when it leaves this station.  `from` is the
    /// station the route is looked up for (the composite, for an exit).
    pub fn next_station(
        &mut self,
        from:   StationId,
        entity: &mut Entity,
        ty:     &EntityType,
    ) -> StationResult<StationId> {
        let mode = self.send.as_mut().ok_or(StationError::NoSendMode(self.id))?;
        mode.next_station(from, entity, ty)
    }

    // ── Requirements ──────────────────────────────────────────────────────

    pub fn add_seize_requirement(&mut self, requirement: SeizeRequirement) -> StationResult<()> {
        match &mut self.kind {
            StationKind::Seize { requirements, .. } => requirements.push(self.id, requirement),
            _ => Err(StationError::WrongKind { station: self.id, expected: "seize" }),
        }
    }

    pub fn add_release_requirement(&mut self, requirement: ReleaseRequirement) -> StationResult<()> {
        match &mut self.kind {
            StationKind::Release { requirements } => requirements.push(self.id, requirement),
            _ => Err(StationError::WrongKind { station: self.id, expected: "release" }),
        }
    }
}
