use des_core::{EntityId, ErrorKind, RequestId, ResourceId, ResourceSetId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResourceError {
    #[error("resource {0} not found")]
    UnknownResource(ResourceId),

    #[error("resource set {0} not found")]
    UnknownSet(ResourceSetId),

    #[error("request {0} not found (already satisfied or never created)")]
    UnknownRequest(RequestId),

    #[error("a resource or set named {0:?} already exists")]
    DuplicateName(String),

    #[error("resource set {0:?} has no members")]
    EmptySet(String),

    #[error("{what} must be positive")]
    NonPositiveAmount { what: &'static str },

    #[error("request {0} has no owning entity")]
    NoEntity(RequestId),

    #[error("request {0} has no satisfaction listener attached")]
    MissingListener(RequestId),

    #[error("request {0} was already submitted")]
    AlreadySubmitted(RequestId),

    #[error("{resource} has {available} units available, {requested} requested")]
    InsufficientUnits {
        resource:  ResourceId,
        requested: u32,
        available: u32,
    },

    #[error("{entity} holds no allocation on {resource}")]
    NoAllocation {
        entity:   EntityId,
        resource: ResourceId,
    },

    #[error("{entity} tried to release {requested} units of {resource} but holds {held}")]
    OverRelease {
        entity:    EntityId,
        resource:  ResourceId,
        requested: u32,
        held:      u32,
    },

    #[error("capacity {capacity} of {resource} is below the {allocated} units allocated")]
    CapacityBelowAllocated {
        resource:  ResourceId,
        capacity:  u32,
        allocated: u32,
    },

    #[error("{entity} has no seize on {set} matching {policy}")]
    NoSeizeRecord {
        entity: EntityId,
        set:    ResourceSetId,
        policy: String,
    },

    #[error("a selection rule may only be given for resource set targets")]
    RuleOnResource,

    #[error("{first} and {second} tie on priority {priority} and sequence {sequence}")]
    OrderingTie {
        priority: i32,
        sequence: u64,
        first:    String,
        second:   String,
    },

    #[error("resource bookkeeping inconsistent: {0}")]
    Inconsistent(String),

    #[error("resource CSV parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ResourceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ResourceError::OrderingTie { .. } | ResourceError::Inconsistent(_) => {
                ErrorKind::Internal
            }
            ResourceError::MissingListener(_) => ErrorKind::MissingConfiguration,
            ResourceError::Io(_) => ErrorKind::Io,
            _ => ErrorKind::InvalidArgument,
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;
