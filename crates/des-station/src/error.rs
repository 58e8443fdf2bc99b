use des_core::{EntityId, EntityTypeId, ErrorKind, StationId};
use des_resource::ResourceError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StationError {
    #[error("station {0} not found")]
    UnknownStation(StationId),

    #[error("a station named {0:?} already exists")]
    DuplicateName(String),

    #[error("station {station}: {option} requirement resolution yielded nothing for {entity}")]
    NoRequirements {
        station: StationId,
        entity:  EntityId,
        option:  &'static str,
    },

    #[error("station {station}: no delay source configured for {entity}")]
    NoDelaySource {
        station: StationId,
        entity:  EntityId,
    },

    #[error("station {station}: delay source produced negative duration {value}")]
    NegativeDelay {
        station: StationId,
        value:   f64,
    },

    #[error("station {0} has no send mode configured")]
    NoSendMode(StationId),

    #[error("station {station}: {entity} has run off the end of its sequence")]
    SequenceExhausted {
        station: StationId,
        entity:  EntityId,
    },

    #[error("station {station}: entity type {entity_type} declares no route from here")]
    NoRoute {
        station:     StationId,
        entity_type: EntityTypeId,
    },

    #[error("station {station}: sender strategy picked no destination for {entity}")]
    SenderDeclined {
        station: StationId,
        entity:  EntityId,
    },

    #[error("station {0} does not receive entities")]
    NotReceiving(StationId),

    #[error("station {station} is wired into composite {composite}; its send mode is fixed")]
    CompositeMember {
        station:   StationId,
        composite: StationId,
    },

    #[error("station {station} is not a {expected} station")]
    WrongKind {
        station:  StationId,
        expected: &'static str,
    },

    #[error("station {station} resolves requirements {option}, not directly")]
    NotDirect {
        station: StationId,
        option:  &'static str,
    },

    #[error("composite {0:?} has no members")]
    EmptyComposite(String),

    #[error("invalid sender configuration: {0}")]
    InvalidSender(String),

    #[error(transparent)]
    Resource(#[from] ResourceError),
}

impl StationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StationError::NoRequirements { .. }
            | StationError::NoDelaySource { .. }
            | StationError::NoSendMode(_)
            | StationError::SequenceExhausted { .. }
            | StationError::NoRoute { .. }
            | StationError::SenderDeclined { .. } => ErrorKind::MissingConfiguration,
            StationError::NotReceiving(_) | StationError::CompositeMember { .. } => {
                ErrorKind::Unsupported
            }
            StationError::Resource(e) => e.kind(),
            _ => ErrorKind::InvalidArgument,
        }
    }
}

pub type StationResult<T> = Result<T, StationError>;
