use des_core::{EntityId, EntityTypeId, ErrorKind, QueueId};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EntityError {
    #[error("entity {0} not found (never created or already disposed)")]
    UnknownEntity(EntityId),

    #[error("entity type {0} not found")]
    UnknownType(EntityTypeId),

    #[error("queue {0} not found")]
    UnknownQueue(QueueId),

    #[error("an entity type or queue named {0:?} already exists")]
    DuplicateName(String),

    #[error("{entity} is already waiting in {queue}")]
    AlreadyQueued {
        entity: EntityId,
        queue:  QueueId,
    },

    #[error("{entity} is not waiting in {queue}")]
    NotQueued {
        entity: EntityId,
        queue:  QueueId,
    },
}

impl EntityError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

pub type EntityResult<T> = Result<T, EntityError>;
