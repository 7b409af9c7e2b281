//! Mock embedding provider for testing.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "config")]
use clap::Args;
use langengine_core::emb::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage};
use langengine_core::{Error, Result, ServiceHealth};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Configuration for the mock embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct MockEmbeddingConfig {
    /// Dimensions of mock embedding vectors.
    #[cfg_attr(
        feature = "config",
        arg(
            long = "mock-embedding-dimensions",
            env = "MOCK_EMBEDDING_DIMENSIONS",
            default_value = "128"
        )
    )]
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// When set, every request fails with this message.
    #[cfg_attr(feature = "config", arg(long = "mock-embedding-failure", env = "MOCK_EMBEDDING_FAILURE"))]
    #[serde(default)]
    pub failure: Option<String>,
}

fn default_dimensions() -> usize {
    128
}

impl Default for MockEmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: default_dimensions(),
            failure: None,
        }
    }
}

#[derive(Debug, Default)]
struct Counters {
    calls: AtomicUsize,
    inputs: AtomicUsize,
}

/// Deterministic embedding provider.
///
/// Clones share their call counters, so a test can hand one clone to an
/// `EmbeddingService` and inspect the other.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    config: Arc<MockEmbeddingConfig>,
    fixtures: Arc<HashMap<String, Vec<f32>>>,
    counters: Arc<Counters>,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::from_config(MockEmbeddingConfig::default())
    }
}

impl MockEmbeddingProvider {
    /// Creates a provider producing vectors of `dimensions` components.
    pub fn new(dimensions: usize) -> Self {
        Self::from_config(MockEmbeddingConfig {
            dimensions,
            failure: None,
        })
    }

    /// Creates a provider from a configuration.
    pub fn from_config(config: MockEmbeddingConfig) -> Self {
        Self {
            config: Arc::new(config),
            fixtures: Arc::new(HashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    /// Creates a provider whose requests always fail.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::from_config(MockEmbeddingConfig {
            failure: Some(message.into()),
            ..Default::default()
        })
    }

    /// Returns `vector` whenever `text` is embedded.
    pub fn with_fixture(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        Arc::make_mut(&mut self.fixtures).insert(text.into(), vector);
        self
    }

    /// Returns the number of `embed` calls received.
    pub fn call_count(&self) -> usize {
        self.counters.calls.load(Ordering::SeqCst)
    }

    /// Returns the total number of texts embedded.
    pub fn input_count(&self) -> usize {
        self.counters.inputs.load(Ordering::SeqCst)
    }

    /// Returns the vector this provider produces for `text`.
    pub fn vector_for(&self, text: &str) -> Vec<f32> {
        if let Some(vector) = self.fixtures.get(text) {
            return vector.clone();
        }

        let mut values = Vec::with_capacity(self.config.dimensions);
        let mut block = 0u32;
        while values.len() < self.config.dimensions {
            let mut hasher = Sha256::new();
            hasher.update(block.to_le_bytes());
            hasher.update(text.as_bytes());
            let digest = hasher.finalize();
            for chunk in digest.chunks_exact(2) {
                if values.len() == self.config.dimensions {
                    break;
                }
                let raw = u16::from_le_bytes([chunk[0], chunk[1]]);
                values.push(raw as f32 / u16::MAX as f32 * 2.0 - 1.0);
            }
            block += 1;
        }

        let norm = values.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            values.iter_mut().for_each(|v| *v /= norm);
        }
        values
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, request: &EmbeddingRequest) -> Result<EmbeddingResponse> {
        self.counters.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(message) = &self.config.failure {
            return Err(Error::external_error().with_message(message.clone()));
        }

        self.counters
            .inputs
            .fetch_add(request.len(), Ordering::SeqCst);
        let embeddings = request.inputs.iter().map(|t| self.vector_for(t)).collect();
        let tokens = request
            .inputs
            .iter()
            .map(|t| t.split_whitespace().count() as u32)
            .sum();

        Ok(EmbeddingResponse::new(embeddings)
            .with_model(request.model.clone().unwrap_or_else(|| "mock-embedding".into()))
            .with_usage(EmbeddingUsage {
                total_tokens: tokens,
            }))
    }

    async fn health_check(&self) -> Result<ServiceHealth> {
        match &self.config.failure {
            Some(message) => Ok(ServiceHealth::unhealthy(message.clone())),
            None => Ok(ServiceHealth::healthy()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_are_deterministic_and_normalised() {
        let provider = MockEmbeddingProvider::new(40);
        let a = provider.vector_for("hello");
        assert_eq!(a.len(), 40);
        assert_eq!(a, provider.vector_for("hello"));
        assert_ne!(a, provider.vector_for("world"));

        let norm = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn fixtures_override_hashing() {
        let provider = MockEmbeddingProvider::new(2).with_fixture("pinned", vec![1.0, 0.0]);
        assert_eq!(provider.vector_for("pinned"), vec![1.0, 0.0]);
    }

    #[tokio::test]
    async fn clones_share_counters() {
        let provider = MockEmbeddingProvider::new(3);
        let clone = provider.clone();
        clone
            .embed(&EmbeddingRequest::new(["a", "b"]))
            .await
            .unwrap();
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.input_count(), 2);
    }

    #[tokio::test]
    async fn failing_provider_errors() {
        let provider = MockEmbeddingProvider::failing("quota exhausted");
        let err = provider
            .embed(&EmbeddingRequest::new(["a"]))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
        assert!(!provider.health_check().await.unwrap().is_healthy());
    }
}
