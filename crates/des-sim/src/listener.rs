//! Seize listeners: who is waiting for which grants.

use std::collections::BTreeSet;

use des_core::{EntityId, ListenerId, RequestId, StationId};
use des_resource::Grant;

use crate::{SimError, SimResult};

/// Bookkeeping for one entity's seize at one station.
///
/// `Aggregate` is registered with every request id before the first request
/// is submitted, so an immediate grant can never complete it early.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SeizeListener {
    Single {
        station: StationId,
        entity:  EntityId,
        request: RequestId,
    },
    Aggregate {
        station: StationId,
        entity:  EntityId,
        pending: BTreeSet<RequestId>,
    },
}

impl SeizeListener {
    pub fn station(&self) -> StationId {
        match self {
            SeizeListener::Single { station, .. } | SeizeListener::Aggregate { station, .. } => *station,
        }
    }

    pub fn entity(&self) -> EntityId {
        match self {
            SeizeListener::Single { entity, .. } | SeizeListener::Aggregate { entity, .. } => *entity,
        }
    }

    /// Request ids this listener still expects a satisfying grant for.
    pub fn pending(&self) -> Box<dyn Iterator<Item = RequestId> + '_> {
        match self {
            SeizeListener::Single { request, .. } => Box::new(std::iter::once(*request)),
            SeizeListener::Aggregate { pending, .. } => Box::new(pending.iter().copied()),
        }
    }

    /// Fold one grant in.  Returns `true` once the whole seize is done.
    pub fn on_grant(&mut self, id: ListenerId, grant: &Grant) -> SimResult<bool> {
        match self {
            SeizeListener::Single { request, .. } => {
                if *request != grant.request {
                    return Err(SimError::ListenerMismatch { listener: id, request: grant.request });
                }
                Ok(grant.satisfied)
            }
            SeizeListener::Aggregate { pending, .. } => {
                if !pending.contains(&grant.request) {
                    return Err(SimError::ListenerMismatch { listener: id, request: grant.request });
                }
                if grant.satisfied {
                    pending.remove(&grant.request);
                }
                Ok(pending.is_empty())
            }
        }
    }
}
