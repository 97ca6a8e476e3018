//! Error types for hyperlsh.

use thiserror::Error;

/// Errors that can occur during index construction, mutation, or search.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexError {
    /// Column count of a feature/query matrix does not match the index, or
    /// the inner dimensions of a matrix product disagree.
    #[error("shape mismatch: expected {expected} columns, found {found}")]
    ShapeMismatch { expected: usize, found: usize },

    /// Operation requires `build_index` to have run first.
    #[error("index has not been built")]
    NotBuilt,

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// A restored snapshot is internally inconsistent.
    #[error("inconsistent snapshot: {0}")]
    Snapshot(String),
}

pub type Result<T> = std::result::Result<T, IndexError>;
