//! Simulation time model.
//!
//! # Design
//!
//! Simulated time is a continuous, non-negative `f64` wrapped in `SimTime`.
//! Unlike a raw float, `SimTime` is totally ordered (`f64::total_cmp`) so it
//! can key a `BTreeMap` in the event calendar.  Durations stay plain `f64`.

use std::cmp::Ordering;
use std::fmt;

// ── SimTime ───────────────────────────────────────────────────────────────────

/// An absolute point in simulated time.
#[derive(Copy, Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    /// Return the time `delay` after `self`.
    #[inline]
    pub fn offset(self, delay: f64) -> SimTime {
        SimTime(self.0 + delay)
    }

    /// Time elapsed from `earlier` to `self`.
    #[inline]
    pub fn since(self, earlier: SimTime) -> f64 {
        self.0 - earlier.0
    }

    #[inline]
    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl std::ops::Add<f64> for SimTime {
    type Output = SimTime;
    #[inline]
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

impl std::ops::Sub for SimTime {
    type Output = f64;
    #[inline]
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={:.3}", self.0)
    }
}

// ── ModelConfig ───────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically built by the application (or deserialised with the `serde`
/// feature) and handed to the model builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelConfig {
    /// Master RNG seed.  The same seed always produces identical results.
    pub seed: u64,

    /// Stop once the next event lies beyond this time.  `None` runs until
    /// the calendar is empty.
    pub end_time: Option<f64>,

    /// Hard cap on executed events, a guard against runaway models.
    pub max_events: Option<u64>,
}

impl ModelConfig {
    /// The end of the run as a `SimTime`, if bounded.
    #[inline]
    pub fn end_time(&self) -> Option<SimTime> {
        self.end_time.map(SimTime)
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { seed: 0, end_time: None, max_events: None }
    }
}
