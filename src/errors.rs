use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur in the Nexarion engine
#[derive(Error, Debug)]
pub enum NexarionError {
    /// Stimulus rejected before it reached the impulse set
    #[error("Invalid stimulus: {0}")]
    InvalidStimulus(Arc<String>),

    /// No snapshot exists at the given path
    #[error("No emotional snapshot found at {path}")]
    PersistenceNotFound { path: PathBuf },

    /// Snapshot exists but could not be parsed
    #[error("Corrupt emotional snapshot at {path}: {message}")]
    PersistenceCorrupt { path: PathBuf, message: Arc<String> },

    /// Snapshot could not be written
    #[error("Failed to write emotional snapshot {path}: {message}")]
    PersistenceWriteFailure { path: PathBuf, message: Arc<String> },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(Arc<String>),

    /// Error when serializing data
    #[error("Serialization error: {0}")]
    SerializationError(Arc<String>),

    /// Completion backend failed
    #[error("Backend error: {0}")]
    BackendError(Arc<String>),

    /// The emotion actor task has stopped
    #[error("Emotion actor is no longer running")]
    ActorClosed,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Type alias for Result with NexarionError
pub type Result<T> = std::result::Result<T, NexarionError>;

impl NexarionError {
    pub fn invalid_stimulus(message: impl Into<String>) -> Self {
        Self::InvalidStimulus(Arc::new(message.into()))
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigurationError(Arc::new(message.into()))
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self::BackendError(Arc::new(message.into()))
    }

    /// Whether the caller may continue with in-memory or default state.
    ///
    /// Nothing in the emotional core is fatal: missing or corrupt snapshots
    /// fall back to defaults and write failures leave memory authoritative.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidStimulus(_)
                | Self::PersistenceNotFound { .. }
                | Self::PersistenceCorrupt { .. }
                | Self::PersistenceWriteFailure { .. }
        )
    }
}

impl From<serde_json::Error> for NexarionError {
    fn from(error: serde_json::Error) -> Self {
        Self::SerializationError(Arc::new(error.to_string()))
    }
}

/// Enable cloning for NexarionError
impl Clone for NexarionError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidStimulus(msg) => Self::InvalidStimulus(Arc::clone(msg)),
            Self::PersistenceNotFound { path } => Self::PersistenceNotFound { path: path.clone() },
            Self::PersistenceCorrupt { path, message } => Self::PersistenceCorrupt {
                path: path.clone(),
                message: Arc::clone(message),
            },
            Self::PersistenceWriteFailure { path, message } => Self::PersistenceWriteFailure {
                path: path.clone(),
                message: Arc::clone(message),
            },
            Self::ConfigurationError(msg) => Self::ConfigurationError(Arc::clone(msg)),
            Self::SerializationError(msg) => Self::SerializationError(Arc::clone(msg)),
            Self::BackendError(msg) => Self::BackendError(Arc::clone(msg)),
            Self::ActorClosed => Self::ActorClosed,
            Self::IoError(err) => Self::IoError(std::io::Error::new(err.kind(), err.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persistence_errors_are_recoverable() {
        let not_found = NexarionError::PersistenceNotFound {
            path: PathBuf::from("state.json"),
        };
        assert!(not_found.is_recoverable());
        assert!(NexarionError::invalid_stimulus("empty name").is_recoverable());
        assert!(!NexarionError::ActorClosed.is_recoverable());
    }

    #[test]
    fn test_clone_keeps_message() {
        let err = NexarionError::PersistenceCorrupt {
            path: PathBuf::from("state.json"),
            message: Arc::new("expected value".to_string()),
        };
        assert_eq!(err.clone().to_string(), err.to_string());
    }
}
