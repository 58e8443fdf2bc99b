//! Toolkit error type and the shared error taxonomy.
//!
//! Every `des-*` crate defines its own error enum and wraps lower-level
//! errors with `#[from]`.  All of them answer [`ErrorKind`] so callers can
//! tell a bad argument from a missing configuration without matching on
//! every variant.

use thiserror::Error;

/// Coarse classification shared by every error in the workspace.
///
/// All kinds are fatal: the run that raised one is expected to stop.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum ErrorKind {
    /// Unknown id, non-positive amount, malformed requirement set, …
    InvalidArgument,
    /// A mode was selected but nothing was configured behind it.
    MissingConfiguration,
    /// The target cannot perform the operation (e.g. a non-receiving station).
    Unsupported,
    /// Bookkeeping is out of sync; indicates a defect.
    Internal,
    /// Reading external input failed.
    Io,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ErrorKind::InvalidArgument      => "invalid argument",
            ErrorKind::MissingConfiguration => "missing configuration",
            ErrorKind::Unsupported          => "unsupported operation",
            ErrorKind::Internal             => "internal consistency",
            ErrorKind::Io                   => "i/o",
        })
    }
}

/// The base error type for `des-core` and a common leaf for sub-crates.
#[derive(Debug, Error)]
pub enum DesError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("missing configuration: {0}")]
    MissingConfiguration(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DesError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DesError::InvalidArgument(_) | DesError::Parse(_) => ErrorKind::InvalidArgument,
            DesError::MissingConfiguration(_)                 => ErrorKind::MissingConfiguration,
            DesError::Io(_)                                   => ErrorKind::Io,
        }
    }
}

/// Shorthand result type for `des-core`.
pub type DesResult<T> = Result<T, DesError>;
