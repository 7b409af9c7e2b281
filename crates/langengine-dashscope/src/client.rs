//! DashScope embeddings client.

use std::time::Instant;

use async_trait::async_trait;
use langengine_core::ServiceHealth;
use langengine_core::emb::{EmbeddingProvider, EmbeddingRequest, EmbeddingResponse, EmbeddingUsage};
use langengine_http::HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::{DashScopeConfig, TRACING_TARGET};

#[derive(Debug, Serialize)]
struct EmbeddingsBody<'a> {
    model: &'a str,
    input: &'a [String],
    encoding_format: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsReply {
    #[serde(default)]
    data: Vec<EmbeddingData>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<UsageReply>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct UsageReply {
    #[serde(default)]
    total_tokens: u32,
}

/// Client for the DashScope embeddings endpoint.
#[derive(Debug, Clone)]
pub struct DashScopeClient {
    http: HttpClient,
    config: DashScopeConfig,
}

impl DashScopeClient {
    /// Creates a client, validating the configuration first.
    pub fn new(config: DashScopeConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(config.http_config()?)?;

        tracing::debug!(
            target: TRACING_TARGET,
            model = %config.model,
            base_url = %config.base_url,
            "DashScope client initialized"
        );

        Ok(Self { http, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &DashScopeConfig {
        &self.config
    }

    /// Embeds `inputs` with `model` (or the configured model), one vector per
    /// input in input order.
    pub async fn embed_texts(
        &self,
        inputs: &[String],
        model: Option<&str>,
    ) -> Result<EmbeddingResponse> {
        let model = model.unwrap_or(self.config.model.as_str());
        if inputs.is_empty() {
            return Ok(EmbeddingResponse::new(Vec::new()).with_model(model));
        }

        let mut embeddings = Vec::with_capacity(inputs.len());
        let mut total_tokens = 0u32;
        let mut reported_model = None;

        for chunk in inputs.chunks(self.config.max_batch_size) {
            let reply = self.embed_chunk(chunk, model).await?;
            if let Some(usage) = reply.usage {
                total_tokens = total_tokens.saturating_add(usage.total_tokens);
            }
            reported_model = reply.model.or(reported_model);
            embeddings.extend(order_by_index(reply.data, chunk.len())?);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            model = %model,
            inputs = inputs.len(),
            total_tokens,
            "Embeddings generated"
        );

        Ok(EmbeddingResponse::new(embeddings)
            .with_model(reported_model.unwrap_or_else(|| model.to_owned()))
            .with_usage(EmbeddingUsage { total_tokens }))
    }

    async fn embed_chunk(&self, chunk: &[String], model: &str) -> Result<EmbeddingsReply> {
        let body = EmbeddingsBody {
            model,
            input: chunk,
            encoding_format: "float",
            dimensions: self.config.dimensions,
        };
        let reply = self.http.post_json("embeddings", &body).await?;
        Ok(reply)
    }
}

/// Places each vector at its `index`, requiring exactly one per input.
fn order_by_index(data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(Error::invalid_response(format!(
            "expected {} embeddings, got {}",
            expected,
            data.len()
        )));
    }

    let mut slots: Vec<Option<Vec<f32>>> = vec![None; expected];
    for item in data {
        let slot = slots.get_mut(item.index).ok_or_else(|| {
            Error::invalid_response(format!("embedding index {} out of range", item.index))
        })?;
        if slot.replace(item.embedding).is_some() {
            return Err(Error::invalid_response(format!(
                "duplicate embedding index {}",
                item.index
            )));
        }
    }

    // Lengths match and indices are unique, so every slot is filled.
    Ok(slots.into_iter().flatten().collect())
}

#[async_trait]
impl EmbeddingProvider for DashScopeClient {
    async fn embed(&self, request: &EmbeddingRequest) -> langengine_core::Result<EmbeddingResponse> {
        let response = self
            .embed_texts(&request.inputs, request.model.as_deref())
            .await?;
        Ok(response)
    }

    async fn health_check(&self) -> langengine_core::Result<ServiceHealth> {
        let started = Instant::now();
        let sample = ["ping".to_owned()];

        let health = match self.embed_texts(&sample, None).await {
            Ok(response) => {
                let dimension = response.embeddings.first().map_or(0, Vec::len);
                ServiceHealth::healthy().with_dimension(dimension)
            }
            Err(e) => {
                tracing::warn!(target: TRACING_TARGET, error = %e, "DashScope health check failed");
                ServiceHealth::unhealthy(e.to_string())
            }
        };

        Ok(health.with_latency(started.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer, batch: usize) -> DashScopeClient {
        let config = DashScopeConfig::new("sk-test")
            .unwrap()
            .with_base_url(format!("{}/compatible-mode/v1", server.uri()))
            .with_max_batch_size(batch)
            .with_max_retries(0);
        DashScopeClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn restores_input_order() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "text-embedding-v2",
                "input": ["a", "b"],
                "encoding_format": "float"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "model": "text-embedding-v2",
                "data": [
                    {"object": "embedding", "index": 1, "embedding": [0.0, 1.0]},
                    {"object": "embedding", "index": 0, "embedding": [1.0, 0.0]}
                ],
                "usage": {"prompt_tokens": 2, "total_tokens": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server, 10)
            .embed(&EmbeddingRequest::new(["a", "b"]))
            .await
            .unwrap();
        assert_eq!(response.embeddings, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        assert_eq!(response.usage, Some(EmbeddingUsage { total_tokens: 2 }));
        assert_eq!(response.model.as_deref(), Some("text-embedding-v2"));
    }

    #[tokio::test]
    async fn health_check_reports_dimension() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/embeddings"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"object": "embedding", "index": 0, "embedding": [0.1, 0.2, 0.3]}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let health = client(&server, 10).health_check().await.unwrap();
        assert!(health.is_healthy());
        assert_eq!(health.dimension, Some(3));
        assert!(health.latency.is_some());
    }

    #[tokio::test]
    async fn splits_large_inputs_into_batches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/embeddings"))
            .and(body_partial_json(json!({"input": ["a", "b"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [
                    {"index": 0, "embedding": [1.0]},
                    {"index": 1, "embedding": [2.0]}
                ],
                "usage": {"total_tokens": 2}
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/compatible-mode/v1/embeddings"))
            .and(body_partial_json(json!({"input": ["c"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"index": 0, "embedding": [3.0]}],
                "usage": {"total_tokens": 1}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = client(&server, 2)
            .embed(&EmbeddingRequest::new(["a", "b", "c"]))
            .await
            .unwrap();
        assert_eq!(response.embeddings, vec![vec![1.0], vec![2.0], vec![3.0]]);
        assert_eq!(response.usage.map(|u| u.total_tokens), Some(3));
    }

    #[tokio::test]
    async fn empty_input_skips_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let response = client(&server, 10)
            .embed(&EmbeddingRequest::default())
            .await
            .unwrap();
        assert!(response.embeddings.is_empty());
    }

    #[tokio::test]
    async fn api_errors_carry_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": {"message": "Incorrect API key provided.", "code": "invalid_api_key"}
            })))
            .mount(&server)
            .await;

        let err = client(&server, 10)
            .embed_texts(&["a".to_owned()], None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "DASHSCOPE_EMBEDDING_ERROR");
        assert_eq!(err.status_code(), Some(401));
        assert!(err.to_string().contains("Incorrect API key provided."));

        let health = client(&server, 10).health_check().await.unwrap();
        assert!(!health.is_healthy());
    }

    #[test]
    fn rejects_missing_or_duplicate_indices() {
        let data = vec![
            EmbeddingData { embedding: vec![1.0], index: 0 },
            EmbeddingData { embedding: vec![2.0], index: 0 },
        ];
        assert!(order_by_index(data, 2).is_err());

        let data = vec![EmbeddingData { embedding: vec![1.0], index: 3 }];
        assert!(order_by_index(data, 1).is_err());

        assert!(order_by_index(Vec::new(), 1).is_err());
    }
}
