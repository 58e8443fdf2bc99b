use des_core::{DesError, EntityId, ErrorKind, ListenerId, RequestId, StationId};
use des_entity::EntityError;
use des_executive::ExecutiveError;
use des_resource::ResourceError;
use des_station::StationError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("model configuration error: {0}")]
    Config(String),

    #[error("{entity} reached dispose station {station} still holding resources")]
    HoldsAllocations {
        entity:  EntityId,
        station: StationId,
    },

    #[error("grant addressed to unknown listener {0}")]
    UnknownListener(ListenerId),

    #[error("listener {listener} was not waiting for {request}")]
    ListenerMismatch {
        listener: ListenerId,
        request:  RequestId,
    },

    #[error(transparent)]
    Station(#[from] StationError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error(transparent)]
    Executive(#[from] ExecutiveError),

    #[error(transparent)]
    Core(#[from] DesError),
}

impl SimError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SimError::Config(_) | SimError::HoldsAllocations { .. } => ErrorKind::InvalidArgument,
            SimError::UnknownListener(_) | SimError::ListenerMismatch { .. } => ErrorKind::Internal,
            SimError::Station(e) => e.kind(),
            SimError::Resource(e) => e.kind(),
            SimError::Entity(e) => e.kind(),
            SimError::Executive(e) => e.kind(),
            SimError::Core(e) => e.kind(),
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
