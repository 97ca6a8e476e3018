//! Error types for snapshot persistence.

use crate::error::IndexError;
use thiserror::Error;

/// Errors that can occur while exporting, importing, saving or loading an index.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// I/O error (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Format error (invalid magic bytes, unsupported version, truncation)
    #[error("format error: {0}")]
    Format(String),

    /// Serialization error (postcard)
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Snapshot decoded but describes an inconsistent index
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl From<postcard::Error> for PersistenceError {
    fn from(e: postcard::Error) -> Self {
        Self::Serialization(format!("postcard error: {}", e))
    }
}

/// Result type for persistence operations.
pub type PersistenceResult<T> = Result<T, PersistenceError>;
