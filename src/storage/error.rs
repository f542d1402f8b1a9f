//! Error types for storage operations

use std::fmt;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations
#[derive(Debug)]
pub enum StorageError {
    /// The database could not be opened
    OpenFailed(String),

    /// A read or write transaction failed
    TransactionFailed(String),

    /// Status record serialization/deserialization error
    SerializationError(String),

    /// Nothing has been written yet
    NotInitialized,

    /// Backend-specific error
    BackendError(String),

    /// I/O error (file access, etc.)
    IoError(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::OpenFailed(msg) => write!(f, "failed to open status store: {}", msg),
            StorageError::TransactionFailed(msg) => {
                write!(f, "status store transaction failed: {}", msg)
            }
            StorageError::SerializationError(msg) => {
                write!(f, "status serialization error: {}", msg)
            }
            StorageError::NotInitialized => {
                write!(f, "no status data available, refresh first")
            }
            StorageError::BackendError(msg) => write!(f, "storage backend error: {}", msg),
            StorageError::IoError(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::IoError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

impl From<sled::Error> for StorageError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(io_err) => StorageError::IoError(io_err),
            _ => StorageError::TransactionFailed(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::SerializationError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for StorageError {
    fn from(err: tokio::task::JoinError) -> Self {
        StorageError::BackendError(err.to_string())
    }
}
