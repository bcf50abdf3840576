//! Error types for calmirror.

use thiserror::Error;

/// Errors that can occur while loading or reconciling calendars.
#[derive(Error, Debug)]
pub enum MirrorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    /// A removal was requested for a fingerprint the child calendar does not hold.
    #[error("No event with fingerprint [{fingerprint}] in calendar '{entity_id}'")]
    UnknownFingerprint {
        entity_id: String,
        fingerprint: String,
    },

    #[error("Sync worker used out of order: {0}")]
    InvalidState(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for MirrorError {
    fn from(e: serde_json::Error) -> Self {
        MirrorError::Serialization(e.to_string())
    }
}

/// Result type alias for calmirror operations.
pub type MirrorResult<T> = Result<T, MirrorError>;
