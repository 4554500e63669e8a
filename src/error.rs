use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Study not found: {0}")]
    StudyNotFound(String),

    #[error("Item not found in ordered list: {0}")]
    ItemNotFound(String),

    #[error("Target index {index} out of range for list of {len} items")]
    InvalidTargetIndex { index: usize, len: usize },

    #[error("Invalid study ID format: {0}")]
    InvalidStudyId(String),

    #[error("Confirmation dialog is not mounted")]
    DialogUnavailable,

    #[error("Confirmation queue is full ({0} pending)")]
    DialogQueueFull(usize),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Console data directory not initialized")]
    ProjectNotInitialized,

    #[error("{0}")]
    Other(String),
}

#[cfg(feature = "sqlite-storage")]
impl From<rusqlite::Error> for ConsoleError {
    fn from(err: rusqlite::Error) -> Self {
        Self::StorageError(err.to_string())
    }
}
