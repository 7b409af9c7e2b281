//! Vector store error types.

use thiserror::Error;

/// Result type for vector store operations.
pub type VectorResult<T> = Result<T, VectorError>;

/// Vector store errors.
#[derive(Debug, Error)]
pub enum VectorError {
    /// A document vector does not match the configured dimension.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A query vector does not match the configured dimension.
    #[error("Query vector dimension mismatch: expected {expected}, got {actual}")]
    QueryDimensionMismatch { expected: usize, actual: usize },

    /// An index build was requested with no vectors present.
    #[error("No vectors to build index")]
    NoVectors,

    /// No persisted index exists at the configured location.
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// A search was issued against an engine whose index was never built.
    #[error("Index not built")]
    IndexNotBuilt,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Embedding generation failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem error while persisting or loading an index.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl VectorError {
    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates a query dimension mismatch error.
    pub fn query_dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::QueryDimensionMismatch { expected, actual }
    }

    /// Creates an index not found error.
    pub fn index_not_found(location: impl Into<String>) -> Self {
        Self::IndexNotFound(location.into())
    }

    /// Creates an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates an embedding error.
    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::Embedding(msg.into())
    }

    /// Creates a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<langengine_http::Error> for VectorError {
    fn from(err: langengine_http::Error) -> Self {
        Self::backend(err.to_string())
    }
}

impl From<langengine_core::Error> for VectorError {
    fn from(err: langengine_core::Error) -> Self {
        Self::embedding(err.to_string())
    }
}
