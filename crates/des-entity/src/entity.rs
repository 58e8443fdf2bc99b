//! The flow unit.

use rustc_hash::FxHashMap;

use des_core::{EntityId, EntityTypeId, QueueId, SimTime, StationId};
use des_resource::{DEFAULT_PRIORITY, ReleaseRequirement, SeizeRequirement};

use crate::EntityType;

/// One simulated customer, patient or job.
///
/// Resource holdings are not stored here; the resource manager's ledger is
/// the single source of truth for allocations.
#[derive(Clone, Debug)]
pub struct Entity {
    pub(crate) id:           EntityId,
    pub(crate) type_id:      EntityTypeId,
    pub(crate) created_at:   SimTime,
    pub(crate) station:      StationId,
    pub(crate) arrived_at:   SimTime,
    pub(crate) queue:        Option<QueueId>,
    pub(crate) queued_at:    Option<SimTime>,
    pub(crate) priority:     i32,
    pub(crate) attributes:   FxHashMap<String, f64>,
    seize:                   FxHashMap<StationId, Vec<SeizeRequirement>>,
    release:                 FxHashMap<StationId, Vec<ReleaseRequirement>>,
    /// Index of the next station in the type's sequence.
    cursor:                  usize,
}

impl Entity {
    pub(crate) fn new(id: EntityId, type_id: EntityTypeId, now: SimTime) -> Self {
        Self {
            id,
            type_id,
            created_at: now,
            station: StationId::INVALID,
            arrived_at: now,
            queue: None,
            queued_at: None,
            priority: DEFAULT_PRIORITY,
            attributes: FxHashMap::default(),
            seize: FxHashMap::default(),
            release: FxHashMap::default(),
            cursor: 0,
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn entity_type(&self) -> EntityTypeId {
        self.type_id
    }

    pub fn created_at(&self) -> SimTime {
        self.created_at
    }

    /// The station the entity was last received by.  A composite's exit
    /// rewrites this to the composite itself.
    pub fn current_station(&self) -> StationId {
        self.station
    }

    pub fn set_current_station(&mut self, station: StationId, now: SimTime) {
        self.station = station;
        self.arrived_at = now;
    }

    /// When the entity reached its current station.
    pub fn arrived_at(&self) -> SimTime {
        self.arrived_at
    }

    pub fn queue(&self) -> Option<QueueId> {
        self.queue
    }

    /// Entry time into the current queue.
    pub fn queued_at(&self) -> Option<SimTime> {
        self.queued_at
    }

    /// Rank used by [`Discipline::Ranked`](crate::Discipline::Ranked) queues.
    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    pub fn set_attribute(&mut self, name: impl Into<String>, value: f64) {
        self.attributes.insert(name.into(), value);
    }

    // ── Requirements ──────────────────────────────────────────────────────

    /// Requirements this entity carries for `station`'s `ByEntity` option.
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

    // ── Sequence routing ──────────────────────────────────────────────────

    /// Next station in `ty`'s sequence, advancing the cursor.  `None` once
    /// the sequence is exhausted.
    pub fn advance_sequence(&mut self, ty: &EntityType) -> Option<StationId> {
        let next = ty.sequence().get(self.cursor).copied()?;
        self.cursor += 1;
        Some(next)
    }

    /// Number of sequence steps taken so far.
    pub fn sequence_position(&self) -> usize {
        self.cursor
    }
}
