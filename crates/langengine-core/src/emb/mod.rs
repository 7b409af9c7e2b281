//! Embedding provider abstractions.
//!
//! Vector stores never talk to an embedding model directly; they go through
//! an [`EmbeddingService`], which wraps any [`EmbeddingProvider`]
//! implementation behind a cloneable handle.

mod request;
mod service;

pub use request::{EmbeddingRequest, EmbeddingResponse, EmbeddingUsage};
pub use service::EmbeddingService;

use crate::{Result, ServiceHealth};

/// Tracing target for embedding operations.
pub const TRACING_TARGET: &str = "langengine_core::emb";

/// Core trait for embedding model providers.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generates one embedding per input text, in input order.
    async fn embed(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse>;

    /// Verifies that the provider is reachable and properly configured.
    async fn health_check(&self) -> Result<ServiceHealth>;
}
