//! `EventCalendar`: pending callbacks ordered by (time, scheduling order).
//!
//! # Ordering
//!
//! Events are keyed by `(SimTime, EventId)`.  Event ids are handed out in
//! scheduling order, so two events due at the same instant pop in the order
//! they were scheduled (FIFO tie-break).  `BTreeMap` gives O(log n) insert,
//! pop and cancel.

use std::collections::{BTreeMap, HashMap};

use des_core::{EventId, SimTime};
use tracing::trace;

use crate::{ExecutiveError, ExecutiveResult};

/// The executive contract consumed by the rest of the toolkit.
pub trait Executive<E> {
    /// Schedule `payload` to fire `delay` time units after the current time.
    fn schedule(&mut self, delay: f64, payload: E) -> ExecutiveResult<EventId>;

    /// The current simulated time.
    fn current_time(&self) -> SimTime;
}

/// An event removed from the calendar, ready to execute.
#[derive(Debug, PartialEq)]
pub struct ScheduledEvent<E> {
    pub id:      EventId,
    pub time:    SimTime,
    pub payload: E,
}

/// A priority queue mapping simulated times → payloads.
pub struct EventCalendar<E> {
    inner: BTreeMap<(SimTime, EventId), E>,
    /// Due time of every pending event, for O(log n) cancellation.
    due:      HashMap<EventId, SimTime>,
    now:      SimTime,
    next_id:  u64,
    executed: u64,
}

impl<E> Default for EventCalendar<E> {
    fn default() -> Self {
        Self {
            inner:    BTreeMap::new(),
            due:      HashMap::new(),
            now:      SimTime::ZERO,
            next_id:  0,
            executed: 0,
        }
    }
}

impl<E> EventCalendar<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `payload` at absolute `time`.
    pub fn schedule_at(&mut self, time: SimTime, payload: E) -> ExecutiveResult<EventId> {
        if !time.0.is_finite() {
            return Err(ExecutiveError::InvalidDelay(time.since(self.now)));
        }
        if time < self.now {
            return Err(ExecutiveError::InPast { time, now: self.now });
        }
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.inner.insert((time, id), payload);
        self.due.insert(id, time);
        trace!(%id, %time, pending = self.inner.len(), "event scheduled");
        Ok(id)
    }

    /// Remove the earliest event and advance the clock to its time.
    ///
    /// Returns `None` when nothing is pending; the clock is left untouched.
    pub fn pop_next(&mut self) -> Option<ScheduledEvent<E>> {
        let ((time, id), payload) = self.inner.pop_first()?;
        self.due.remove(&id);
        self.now = time;
        self.executed += 1;
        trace!(%id, %time, "event popped");
        Some(ScheduledEvent { id, time, payload })
    }

    /// Withdraw a pending event.  Returns its payload, or `None` if the event
    /// already fired or was never scheduled.
    pub fn cancel(&mut self, id: EventId) -> Option<E> {
        let time = self.due.remove(&id)?;
        trace!(%id, %time, "event cancelled");
        self.inner.remove(&(time, id))
    }

    /// Due time of the earliest pending event.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.inner.keys().next().map(|(t, _)| *t)
    }

    /// `true` if `id` is still waiting to fire.
    pub fn is_pending(&self, id: EventId) -> bool {
        self.due.contains_key(&id)
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events popped so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<E> Executive<E> for EventCalendar<E> {
    fn schedule(&mut self, delay: f64, payload: E) -> ExecutiveResult<EventId> {
        if !(delay.is_finite() && delay >= 0.0) {
            return Err(ExecutiveError::InvalidDelay(delay));
        }
        self.schedule_at(self.now.offset(delay), payload)
    }

    fn current_time(&self) -> SimTime {
        self.now
    }
}
