//! Where an entity goes when a station is done with it.

use std::fmt;

use tracing::trace;

use des_core::{StationId, ValueSource};
use des_entity::{Entity, EntityType};

use crate::{StationError, StationResult};

/// Pluggable destination strategy for [`SendMode::BySender`].
///
/// Returning `None` means the strategy has nowhere to send this entity,
/// which the model reports as a missing-configuration error.
pub trait EntitySender: Send {
    fn select(&mut self, entity: &Entity) -> Option<StationId>;
}

/// How a station picks the next receiver.  Exactly one mode is active.
pub enum SendMode {
    /// Always the same station.
    Direct(StationId),
    /// The next entry in the entity type's sequence, tracked per entity.
    BySequence,
    /// The entity type's route out of the sending station.
    ByType,
    BySender(Box<dyn EntitySender>),
}

impl SendMode {
    /// Resolve the destination of `entity` leaving station `from`.
    pub fn next_station(
        &mut self,
        from:   StationId,
        entity: &mut Entity,
        ty:     &EntityType,
    ) -> StationResult<StationId> {
        let next = match self {
            SendMode::Direct(to) => *to,
            SendMode::BySequence => entity
                .advance_sequence(ty)
                .ok_or(StationError::SequenceExhausted { station: from, entity: entity.id() })?,
            SendMode::ByType => ty
                .route(from)
                .ok_or(StationError::NoRoute { station: from, entity_type: ty.id() })?,
            SendMode::BySender(sender) => sender
                .select(entity)
                .ok_or(StationError::SenderDeclined { station: from, entity: entity.id() })?,
        };
        trace!(%from, to = %next, entity = %entity.id(), mode = ?self, "route resolved");
        Ok(next)
    }
}

impl fmt::Debug for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SendMode::Direct(s) => write!(f, "Direct({s})"),
            SendMode::BySequence => f.write_str("BySequence"),
            SendMode::ByType => f.write_str("ByType"),
            SendMode::BySender(_) => f.write_str("BySender"),
        }
    }
}

// ── ProbabilisticSender ───────────────────────────────────────────────────────

/// Picks a destination with fixed probabilities, drawing a uniform `[0, 1)`
/// number from its value source for every entity.
pub struct ProbabilisticSender {
    /// (cumulative probability, destination), strictly increasing.
    cumulative: Vec<(f64, StationId)>,
    draws:      Box<dyn ValueSource>,
}

impl ProbabilisticSender {
    /// `choices` pairs each destination with its probability; the
    /// probabilities must be positive and sum to one.
    pub fn new(choices: Vec<(StationId, f64)>, draws: Box<dyn ValueSource>) -> StationResult<Self> {
        if choices.is_empty() {
            return Err(StationError::InvalidSender("no destinations given".into()));
        }
        let mut total = 0.0;
        let mut cumulative = Vec::with_capacity(choices.len());
        for (to, p) in choices {
            if !(p > 0.0 && p <= 1.0) {
                return Err(StationError::InvalidSender(format!(
                    "probability {p} for {to} is outside (0, 1]"
                )));
            }
            total += p;
            cumulative.push((total, to));
        }
        if (total - 1.0).abs() > 1e-9 {
            return Err(StationError::InvalidSender(format!(
                "probabilities sum to {total}, not 1"
            )));
        }
        Ok(Self { cumulative, draws })
    }
}

impl EntitySender for ProbabilisticSender {
    fn select(&mut self, _entity: &Entity) -> Option<StationId> {
        let u = self.draws.next_value();
        self.cumulative
            .iter()
            .find(|(c, _)| u < *c)
            .or(self.cumulative.last())
            .map(|(_, to)| *to)
    }
}

// ── RoundRobinSender ──────────────────────────────────────────────────────────

/// Cycles through its destinations in order.
#[derive(Clone, Debug)]
pub struct RoundRobinSender {
    targets: Vec<StationId>,
    next:    usize,
}

impl RoundRobinSender {
    pub fn new(targets: Vec<StationId>) -> StationResult<Self> {
        if targets.is_empty() {
            return Err(StationError::InvalidSender("no destinations given".into()));
        }
        Ok(Self { targets, next: 0 })
    }
}

impl EntitySender for RoundRobinSender {
    fn select(&mut self, _entity: &Entity) -> Option<StationId> {
        let to = self.targets.get(self.next).copied()?;
        self.next = (self.next + 1) % self.targets.len();
        Some(to)
    }
}
