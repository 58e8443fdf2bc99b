//! A named pool of interchangeable capacity units.

use des_core::{Counter, ObservationSink, RequestId, ResourceId, ResourceSetId};

/// Finite, interchangeable capacity.
///
/// Invariant: `0 ≤ allocated ≤ capacity`.  The waiting list holds the ids of
/// submitted, unsatisfied requests bound to this resource, sorted by
/// (priority, creation sequence).
#[derive(Clone, Debug)]
pub struct Resource {
    pub(crate) id:        ResourceId,
    pub(crate) name:      String,
    pub(crate) capacity:  u32,
    pub(crate) allocated: u32,
    pub(crate) waiting:   Vec<RequestId>,
    /// Sets this resource belongs to, rescanned after it frees units.
    pub(crate) sets:      Vec<ResourceSetId>,
    pub(crate) busy:      Counter,
    pub(crate) seizes:    u64,
}

impl Resource {
    pub(crate) fn new(id: ResourceId, name: String, capacity: u32) -> Self {
        Self {
            id,
            name,
            capacity,
            allocated: 0,
            waiting: Vec::new(),
            sets: Vec::new(),
            busy: Counter::new(),
            seizes: 0,
        }
    }

    pub fn id(&self) -> ResourceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn allocated(&self) -> u32 {
        self.allocated
    }

    #[inline]
    pub fn number_available(&self) -> u32 {
        self.capacity - self.allocated
    }

    #[inline]
    pub fn has_available_units(&self) -> bool {
        self.allocated < self.capacity
    }

    /// Waiting request ids, head first.
    pub fn waiting(&self) -> &[RequestId] {
        &self.waiting
    }

    pub fn number_waiting(&self) -> usize {
        self.waiting.len()
    }

    pub fn sets(&self) -> &[ResourceSetId] {
        &self.sets
    }

    /// Level of busy units over the run (current, min, max).
    pub fn busy(&self) -> &Counter {
        &self.busy
    }

    /// Number of grants made by this resource.
    pub fn times_seized(&self) -> u64 {
        self.seizes
    }

    pub(crate) fn take(&mut self, amount: u32) {
        debug_assert!(amount <= self.number_available());
        self.allocated += amount;
        self.seizes += 1;
        self.busy.increment(amount as f64);
    }

    pub(crate) fn give_back(&mut self, amount: u32) {
        debug_assert!(amount <= self.allocated);
        self.allocated -= amount;
        self.busy.decrement(amount as f64);
    }
}
