//! Cloneable embedding service handle.

use std::sync::Arc;

use super::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, TRACING_TARGET};
use crate::{Error, Result, ServiceHealth};

/// Shared handle to an [`EmbeddingProvider`].
///
/// The service checks that providers return exactly one vector per input so
/// callers can zip inputs with outputs without re-validating.
#[derive(Clone)]
pub struct EmbeddingService {
    inner: Arc<dyn EmbeddingProvider>,
}

impl std::fmt::Debug for EmbeddingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingService").finish_non_exhaustive()
    }
}

impl EmbeddingService {
    /// Wraps a provider.
    pub fn new(provider: impl EmbeddingProvider + 'static) -> Self {
        Self {
            inner: Arc::new(provider),
        }
    }

    /// Wraps an already shared provider.
    pub fn from_arc(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self { inner: provider }
    }

    /// Embeds a request, validating the response cardinality.
    pub async fn embed(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        if request.is_empty() {
            return Ok(EmbeddingResponse::default());
        }

        tracing::debug!(
            target: TRACING_TARGET,
            inputs = request.len(),
            model = ?request.model,
            "Generating embeddings"
        );

        let response = self.inner.embed(request).await?;
        if response.embeddings.len() != request.len() {
            return Err(Error::external_error().with_message(format!(
                "provider returned {} embeddings for {} inputs",
                response.embeddings.len(),
                request.len()
            )));
        }

        Ok(response)
    }

    /// Embeds a batch of texts and returns the raw vectors.
    pub async fn embed_texts(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let response = self.embed(&EmbeddingRequest::new(texts)).await?;
        Ok(response.embeddings)
    }

    /// Embeds a single query text.
    pub async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_texts(vec![text.to_owned()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| Error::external_error().with_message("provider returned no embedding"))
    }

    /// Performs a health check on the wrapped provider.
    pub async fn health_check(&self) -> Result<ServiceHealth> {
        self.inner.health_check().await
    }
}
