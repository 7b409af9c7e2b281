//! Mock implementations of langengine providers for testing.

mod embedding;

pub use embedding::{MockEmbeddingConfig, MockEmbeddingProvider};
use langengine_core::emb::EmbeddingService;

/// Creates an embedding service backed by a mock provider of the given
/// dimension.
pub fn create_embedding_service(dimensions: usize) -> EmbeddingService {
    EmbeddingService::new(MockEmbeddingProvider::new(dimensions))
}
