//! Observation sinks: the opaque statistics collaborator.
//!
//! Stations report time-in-station, queue lengths and counts through
//! [`ObservationSink`].  The core never reads aggregation results back; the
//! concrete sinks here exist so applications and tests have something to
//! read.

/// Accepts observations.  `increment`/`decrement` default to no-ops for
/// sinks that only care about individual samples.
pub trait ObservationSink {
    fn observe(&mut self, value: f64);

    fn increment(&mut self, _amount: f64) {}

    fn decrement(&mut self, _amount: f64) {}
}

// ── NoopSink ──────────────────────────────────────────────────────────────────

/// Discards everything.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoopSink;

impl ObservationSink for NoopSink {
    fn observe(&mut self, _value: f64) {}
}

// ── Tally ─────────────────────────────────────────────────────────────────────

/// Running summary of observed samples.
#[derive(Clone, Debug, Default)]
pub struct Tally {
    count:  u64,
    sum:    f64,
    sum_sq: f64,
    min:    Option<f64>,
    max:    Option<f64>,
}

impl Tally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    /// Sample mean, or `None` before the first observation.
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }

    /// Sample variance (n − 1 denominator); `None` with fewer than two samples.
    pub fn variance(&self) -> Option<f64> {
        if self.count < 2 {
            return None;
        }
        let n = self.count as f64;
        Some(((self.sum_sq - self.sum * self.sum / n) / (n - 1.0)).max(0.0))
    }
}

impl ObservationSink for Tally {
    fn observe(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
        self.sum_sq += value * value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }
}

// ── Counter ───────────────────────────────────────────────────────────────────

/// A level that moves up and down (number in queue, number busy, …).
///
/// `observe` overwrites the level; `increment`/`decrement` move it.  The
/// extremes reached are kept.
#[derive(Clone, Debug, Default)]
pub struct Counter {
    value: f64,
    min:   f64,
    max:   f64,
    total: f64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current level.
    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// Sum of every increment ever applied.
    pub fn total_increments(&self) -> f64 {
        self.total
    }

    fn set(&mut self, value: f64) {
        self.value = value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }
}

impl ObservationSink for Counter {
    fn observe(&mut self, value: f64) {
        self.set(value);
    }

    fn increment(&mut self, amount: f64) {
        self.total += amount;
        self.set(self.value + amount);
    }

    fn decrement(&mut self, amount: f64) {
        self.set(self.value - amount);
    }
}
