use des_core::{ErrorKind, SimTime};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutiveError {
    #[error("event delay must be finite and non-negative, got {0}")]
    InvalidDelay(f64),

    #[error("cannot schedule at {time}: the clock is already at {now}")]
    InPast { time: SimTime, now: SimTime },
}

impl ExecutiveError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

pub type ExecutiveResult<T> = Result<T, ExecutiveError>;
