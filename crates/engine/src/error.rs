use floodwatch_core::error::CoreError;
use floodwatch_core::types::LocationId;

/// Errors raised by the state registry and its workers.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Alert thresholds missing or malformed. Never replaced by defaults.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Update for a location the registry does not know, under the
    /// `reject` policy.
    #[error("Unknown location: {0}")]
    UnknownLocation(LocationId),

    /// Lookup of a location that was never registered.
    #[error("Location {0} is not registered")]
    NotRegistered(LocationId),

    /// A store or directory call failed.
    #[error("Collaborator error: {0}")]
    Collaborator(String),

    #[error("Worker for location {0} has stopped")]
    WorkerStopped(LocationId),
}

impl From<CoreError> for EngineError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Configuration(msg) => Self::Configuration(msg),
            other => Self::Collaborator(other.to_string()),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
