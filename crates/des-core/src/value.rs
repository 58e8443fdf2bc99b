//! Value sources: the opaque "give me the next number" collaborator.
//!
//! Delay stations draw durations from a `ValueSource`; probabilistic senders
//! draw routing probabilities from one; generators draw interarrival times.
//! The core never looks inside.

use crate::{DesError, DesResult, SimRng};

/// Something that returns a float on demand.
///
/// Implementations must be deterministic given their construction inputs
/// (seeded streams included).
pub trait ValueSource: Send {
    fn next_value(&mut self) -> f64;
}

impl<F: FnMut() -> f64 + Send> ValueSource for F {
    #[inline]
    fn next_value(&mut self) -> f64 {
        self()
    }
}

// ── Constant ──────────────────────────────────────────────────────────────────

/// Always the same value.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Constant(pub f64);

impl ValueSource for Constant {
    #[inline]
    fn next_value(&mut self) -> f64 {
        self.0
    }
}

// ── Uniform ───────────────────────────────────────────────────────────────────

/// Continuous uniform on `[low, high)`.
#[derive(Debug)]
pub struct Uniform {
    low:  f64,
    high: f64,
    rng:  SimRng,
}

impl Uniform {
    pub fn new(low: f64, high: f64, rng: SimRng) -> DesResult<Self> {
        if !(low.is_finite() && high.is_finite()) || low > high {
            return Err(DesError::InvalidArgument(format!(
                "uniform range [{low}, {high}) is empty or not finite"
            )));
        }
        Ok(Self { low, high, rng })
    }
}

impl ValueSource for Uniform {
    fn next_value(&mut self) -> f64 {
        self.low + (self.high - self.low) * self.rng.unit()
    }
}

// ── Exponential ───────────────────────────────────────────────────────────────

/// Exponential with the given mean, sampled by inversion.
#[derive(Debug)]
pub struct Exponential {
    mean: f64,
    rng:  SimRng,
}

impl Exponential {
    pub fn new(mean: f64, rng: SimRng) -> DesResult<Self> {
        if !(mean.is_finite() && mean > 0.0) {
            return Err(DesError::InvalidArgument(format!(
                "exponential mean must be positive, got {mean}"
            )));
        }
        Ok(Self { mean, rng })
    }
}

impl ValueSource for Exponential {
    fn next_value(&mut self) -> f64 {
        // unit() is in [0, 1) so 1 - u is in (0, 1] and ln never sees 0.
        -self.mean * (1.0 - self.rng.unit()).ln()
    }
}

// ── Cycle ─────────────────────────────────────────────────────────────────────

/// Replays a fixed list of values forever.  Handy for scripted scenarios.
#[derive(Clone, Debug)]
pub struct Cycle {
    values: Vec<f64>,
    pos:    usize,
}

impl Cycle {
    pub fn new(values: Vec<f64>) -> DesResult<Self> {
        if values.is_empty() {
            return Err(DesError::InvalidArgument("cycle needs at least one value".into()));
        }
        Ok(Self { values, pos: 0 })
    }
}

impl ValueSource for Cycle {
    fn next_value(&mut self) -> f64 {
        let v = self.values[self.pos];
        self.pos = (self.pos + 1) % self.values.len();
        v
    }
}
