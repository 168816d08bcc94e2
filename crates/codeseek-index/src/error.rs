//! Error types for codeseek-index.

use std::num::TryFromIntError;

use crate::embedder::EmbedError;
use crate::fetcher::FetchError;
use crate::vector_store::VectorStoreError;

/// Errors that can occur while indexing or searching code.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// IO error reading configuration or source files.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Vector store error.
    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    /// Embedding endpoint error.
    #[error("embedding error: {0}")]
    Embed(#[from] EmbedError),

    /// Repository acquisition error.
    #[error("fetch error: {0}")]
    Fetch(#[from] FetchError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Embedding length does not match the collection dimensionality.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: u64, actual: usize },

    /// Rejected search parameters.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Integer conversion error.
    #[error("integer conversion failed: {0}")]
    IntConversion(#[from] TryFromIntError),

    /// Background task failed to complete.
    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Generic catch-all error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias using `IndexError`.
pub type Result<T> = std::result::Result<T, IndexError>;
