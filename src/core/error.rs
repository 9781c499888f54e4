//! Error types shared by every orchid component

use thiserror::Error;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, OrchidError>;

/// Kind of registry entry a lookup was made for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Job,
    Action,
    Machine,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKind::Job => write!(f, "job"),
            EntryKind::Action => write!(f, "action"),
            EntryKind::Machine => write!(f, "machine"),
        }
    }
}

/// Error types for orchestrator operations
#[derive(Debug, Error)]
pub enum OrchidError {
    /// Unknown job, action or machine id
    #[error("No {kind} with id '{id}' was found")]
    Lookup { kind: EntryKind, id: String },

    /// No log record matches an id or prefix
    #[error("No log found matching '{0}'")]
    NotFound(String),

    /// A process could not be started
    #[error("Failed to launch '{program}': {reason}")]
    Launch { program: String, reason: String },

    /// A process ran but exited unsuccessfully
    #[error("'{program}' exited with code {code}")]
    ExitStatus { program: String, code: i32 },

    /// Log file or record could not be created, written or read
    #[error("Storage error: {0}")]
    Storage(String),

    /// Setup file could not be parsed or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation arguments are malformed
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl OrchidError {
    pub fn lookup(kind: EntryKind, id: impl Into<String>) -> Self {
        OrchidError::Lookup {
            kind,
            id: id.into(),
        }
    }

    /// Whether this is an execution failure (launch or exit status)
    pub fn is_execution(&self) -> bool {
        matches!(self, OrchidError::Launch { .. } | OrchidError::ExitStatus { .. })
    }
}

impl From<std::io::Error> for OrchidError {
    fn from(err: std::io::Error) -> Self {
        OrchidError::Storage(err.to_string())
    }
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for OrchidError {
    fn from(err: sqlx::Error) -> Self {
        OrchidError::Storage(err.to_string())
    }
}

impl From<serde_yaml::Error> for OrchidError {
    fn from(err: serde_yaml::Error) -> Self {
        OrchidError::Config(err.to_string())
    }
}
