//! Ordered holding areas for entities waiting on resources.

use des_core::{Counter, EntityId, ObservationSink, QueueId, SimTime, Tally};

use crate::{EntityError, EntityResult};

/// Service order of a [`Queue`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
pub enum Discipline {
    /// First in, first out.
    #[default]
    Fifo,
    /// Last in, first out.
    Lifo,
    /// Lowest entity priority first, then arrival order.
    Ranked,
}

/// One member of a queue.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct QueueEntry {
    pub entity:     EntityId,
    pub entered_at: SimTime,
    pub priority:   i32,
    /// Arrival number within this queue.
    pub arrival:    u64,
}

/// Entities waiting in discipline order.
///
/// `entries` is kept so that the next entity to leave is always at the
/// front, except under `Lifo` where it is at the back.
#[derive(Clone, Debug)]
pub struct Queue {
    pub(crate) id:     QueueId,
    pub(crate) name:   String,
    discipline:        Discipline,
    entries:           Vec<QueueEntry>,
    arrivals:          u64,
    waiting_time:      Tally,
    length:            Counter,
}

impl Queue {
    pub fn new(id: QueueId, name: impl Into<String>, discipline: Discipline) -> Self {
        Self {
            id,
            name: name.into(),
            discipline,
            entries: Vec::new(),
            arrivals: 0,
            waiting_time: Tally::new(),
            length: Counter::new(),
        }
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn discipline(&self) -> Discipline {
        self.discipline
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.iter().any(|e| e.entity == entity)
    }

    /// Members, in storage order.
    pub fn entries(&self) -> &[QueueEntry] {
        &self.entries
    }

    /// Time spent in the queue by every entity that has left it.
    pub fn waiting_time(&self) -> &Tally {
        &self.waiting_time
    }

    /// Queue length over time (current, min, max).
    pub fn length(&self) -> &Counter {
        &self.length
    }

    /// Add `entity`.  A duplicate member is an error.
    pub fn enqueue(&mut self, entity: EntityId, priority: i32, now: SimTime) -> EntityResult<()> {
        if self.contains(entity) {
            return Err(EntityError::AlreadyQueued { entity, queue: self.id });
        }
        let entry = QueueEntry { entity, entered_at: now, priority, arrival: self.arrivals };
        self.arrivals += 1;
        match self.discipline {
            Discipline::Fifo | Discipline::Lifo => self.entries.push(entry),
            Discipline::Ranked => {
                let pos = self
                    .entries
                    .partition_point(|e| (e.priority, e.arrival) <= (priority, entry.arrival));
                self.entries.insert(pos, entry);
            }
        }
        self.length.increment(1.0);
        Ok(())
    }

    /// The entry that `remove_next` would return.
    pub fn peek_next(&self) -> Option<&QueueEntry> {
        match self.discipline {
            Discipline::Lifo => self.entries.last(),
            Discipline::Fifo | Discipline::Ranked => self.entries.first(),
        }
    }

    pub fn remove_next(&mut self, now: SimTime) -> Option<QueueEntry> {
        let entry = match self.discipline {
            Discipline::Lifo => self.entries.pop()?,
            Discipline::Fifo | Discipline::Ranked => {
                if self.entries.is_empty() {
                    return None;
                }
                self.entries.remove(0)
            }
        };
        self.record_departure(&entry, now);
        Some(entry)
    }

    /// Remove a specific member, wherever it stands.
    pub fn remove(&mut self, entity: EntityId, now: SimTime) -> EntityResult<QueueEntry> {
        let pos = self
            .entries
            .iter()
            .position(|e| e.entity == entity)
            .ok_or(EntityError::NotQueued { entity, queue: self.id })?;
        let entry = self.entries.remove(pos);
        self.record_departure(&entry, now);
        Ok(entry)
    }

    fn record_departure(&mut self, entry: &QueueEntry, now: SimTime) {
        self.waiting_time.observe(now - entry.entered_at);
        self.length.decrement(1.0);
    }
}
