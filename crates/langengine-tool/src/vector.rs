//! Tool exposing a vector store.

use std::sync::Arc;

use async_trait::async_trait;
use langengine_core::{Document, Metadata};
use langengine_vector::{SearchQuery, SearchRequest, VectorError, VectorStore};
use serde::Deserialize;
use serde_json::json;

use crate::{TRACING_TARGET, Tool, ToolDefinition, ToolError, ToolOutput};

/// Number of results returned when a search omits `k`.
pub const DEFAULT_K: usize = 4;

/// Operations accepted by [`VectorStoreTool`].
#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum VectorStoreOperation {
    /// Embed and store documents; null or missing is an empty add.
    AddDocuments {
        #[serde(default)]
        documents: Option<Vec<Document>>,
    },
    /// Find the documents closest to a text or vector query.
    SimilaritySearch {
        query: SearchQuery,
        #[serde(default)]
        k: Option<usize>,
        #[serde(default)]
        max_distance: Option<f32>,
        #[serde(default)]
        filter: Metadata,
        #[serde(default)]
        include_vectors: bool,
    },
    /// Fetch stored documents by id.
    GetDocuments {
        #[serde(default)]
        ids: Option<Vec<String>>,
    },
    /// Delete documents by id.
    DeleteDocuments {
        #[serde(default)]
        ids: Option<Vec<String>>,
    },
    /// Build the engine index.
    BuildIndex,
    /// Load a persisted engine index.
    LoadIndex,
    /// Report store configuration and size.
    Stats,
}

/// Tool exposing a [`VectorStore`].
pub struct VectorStoreTool {
    store: Arc<VectorStore>,
}

impl VectorStoreTool {
    /// Creates a new vector store tool.
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    /// Returns the wrapped store.
    pub fn store(&self) -> &Arc<VectorStore> {
        &self.store
    }
}

/// Maps a store error to a stable code.
fn error_code(err: &VectorError) -> &'static str {
    match err {
        VectorError::DimensionMismatch { .. } => "DIMENSION_MISMATCH",
        VectorError::QueryDimensionMismatch { .. } => "QUERY_DIMENSION_MISMATCH",
        VectorError::NoVectors => "NO_VECTORS",
        VectorError::IndexNotFound(_) => "INDEX_NOT_FOUND",
        VectorError::IndexNotBuilt => "INDEX_NOT_BUILT",
        VectorError::InvalidConfig(_) => "INVALID_CONFIG",
        VectorError::Embedding(_) => "EMBEDDING_ERROR",
        VectorError::Backend(_) => "BACKEND_ERROR",
        VectorError::Serialization(_) => "SERIALIZATION_ERROR",
        VectorError::Io(_) => "IO_ERROR",
    }
}

impl From<VectorError> for ToolError {
    fn from(err: VectorError) -> Self {
        ToolError::execution(Some(error_code(&err)), err.to_string())
    }
}

#[async_trait]
impl Tool for VectorStoreTool {
    const NAME: &'static str = "vector_store";
    type Operation = VectorStoreOperation;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            "Store documents as embeddings and retrieve the most similar ones for a text or vector query.",
            json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": [
                            "add_documents", "similarity_search", "get_documents",
                            "delete_documents", "build_index", "load_index", "stats"
                        ]
                    },
                    "documents": {
                        "type": "array",
                        "description": "Documents to add: {id?, content, embedding?, metadata?}",
                        "items": {"type": "object"}
                    },
                    "query": {
                        "description": "Query text, or a raw query vector",
                        "oneOf": [
                            {"type": "string"},
                            {"type": "array", "items": {"type": "number"}}
                        ]
                    },
                    "k": {"type": "integer", "minimum": 0, "default": DEFAULT_K},
                    "max_distance": {"type": "number"},
                    "filter": {"type": "object", "description": "Metadata equality filter"},
                    "include_vectors": {"type": "boolean", "default": false},
                    "ids": {"type": "array", "items": {"type": "string"}}
                },
                "required": ["operation"]
            }),
        )
    }

    async fn call(&self, operation: VectorStoreOperation) -> Result<ToolOutput, ToolError> {
        match operation {
            VectorStoreOperation::AddDocuments { documents } => {
                let ids = self
                    .store
                    .add_documents(documents.unwrap_or_default())
                    .await?;
                tracing::debug!(target: TRACING_TARGET, count = ids.len(), "Documents added");
                ToolOutput::json(&json!({ "count": ids.len(), "ids": ids }))
            }
            VectorStoreOperation::SimilaritySearch {
                query,
                k,
                max_distance,
                filter,
                include_vectors,
            } => {
                let request = SearchRequest {
                    query,
                    k: k.unwrap_or(DEFAULT_K),
                    max_distance,
                    filter,
                    include_vectors,
                };
                let results = self.store.similarity_search(request).await?;
                ToolOutput::json(&results)
            }
            VectorStoreOperation::GetDocuments { ids } => {
                let ids = ids.unwrap_or_default();
                let documents = self.store.get_documents(&ids).await?;
                ToolOutput::json(&documents)
            }
            VectorStoreOperation::DeleteDocuments { ids } => {
                let ids = ids.unwrap_or_default();
                self.store.delete_documents(&ids).await?;
                ToolOutput::json(&json!({ "requested": ids.len() }))
            }
            VectorStoreOperation::BuildIndex => {
                self.store.build_index().await?;
                Ok(ToolOutput::text(format!(
                    "Index built with {} vectors",
                    self.store.count().await?
                )))
            }
            VectorStoreOperation::LoadIndex => {
                self.store.load_index().await?;
                Ok(ToolOutput::text(format!(
                    "Index loaded with {} vectors",
                    self.store.count().await?
                )))
            }
            VectorStoreOperation::Stats => ToolOutput::json(&self.store.stats().await?),
        }
    }
}

#[cfg(test)]
mod tests {
    use langengine_core::emb::EmbeddingService;
    use langengine_test::MockEmbeddingProvider;
    use langengine_vector::{BackendConfig, DistanceMetric, OfflineConfig, VectorStoreConfig};
    use serde_json::Value;
    use uuid::Uuid;

    use super::*;
    use crate::{ToolCall, ToolDyn, ToolRegistry};

    fn tool(backend: BackendConfig) -> VectorStoreTool {
        let config = VectorStoreConfig::new(3, DistanceMetric::Euclidean).unwrap();
        let store = VectorStore::new(config, backend)
            .unwrap()
            .with_embedder(EmbeddingService::new(MockEmbeddingProvider::new(3)));
        VectorStoreTool::new(Arc::new(store))
    }

    async fn run(registry: &ToolRegistry, arguments: Value) -> crate::ToolResult {
        registry
            .execute(&ToolCall::new(VectorStoreTool::NAME, arguments))
            .await
    }

    fn registry(backend: BackendConfig) -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        registry.register(tool(backend));
        registry
    }

    #[tokio::test]
    async fn add_then_search_by_vector() {
        let registry = registry(BackendConfig::Memory);

        let added = run(
            &registry,
            json!({
                "operation": "add_documents",
                "documents": [
                    {"id": "a", "content": "alpha", "embedding": [1.0, 2.0, 3.0]},
                    {"id": "b", "page_content": "beta", "embedding": [4.0, 5.0, 6.0]},
                    {"id": "c", "content": "gamma", "embedding": [1.1, 2.1, 3.1]}
                ]
            }),
        )
        .await;
        assert!(added.success, "{:?}", added.error);
        assert_eq!(added.output.as_json().unwrap()["count"], 3);

        let found = run(
            &registry,
            json!({"action": "similarity_search", "query": [1.0, 2.0, 3.0], "k": 2}),
        )
        .await;
        let hits = found.output.as_json().unwrap().as_array().unwrap().clone();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["id"], "a");
        assert_eq!(hits[1]["id"], "c");
    }

    #[tokio::test]
    async fn text_search_uses_embedder() {
        let registry = registry(BackendConfig::Memory);
        run(
            &registry,
            json!({"operation": "add_documents", "documents": [{"id": "n", "content": "notes"}]}),
        )
        .await;

        let found = run(
            &registry,
            json!({"operation": "similarity_search", "query": "notes", "k": 1}),
        )
        .await;
        assert_eq!(found.output.as_json().unwrap()[0]["id"], "n");
    }

    #[tokio::test]
    async fn store_errors_carry_codes() {
        let registry = registry(BackendConfig::Offline(OfflineConfig::default()));

        let result = run(&registry, json!({"operation": "build_index"})).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("[NO_VECTORS] No vectors to build index")
        );

        let result = run(
            &registry,
            json!({"operation": "similarity_search", "query": [1.0], "k": 1}),
        )
        .await;
        assert!(result.error.unwrap().starts_with("[QUERY_DIMENSION_MISMATCH]"));
    }

    #[tokio::test]
    async fn offline_lifecycle_through_tool() {
        let registry = registry(BackendConfig::Offline(OfflineConfig::default()));
        run(
            &registry,
            json!({"operation": "add_documents", "documents": [
                {"id": "a", "content": "alpha", "embedding": [0.0, 0.0, 1.0]}
            ]}),
        )
        .await;

        let not_built = run(
            &registry,
            json!({"operation": "similarity_search", "query": [0.0, 0.0, 1.0]}),
        )
        .await;
        assert_eq!(not_built.error.as_deref(), Some("[INDEX_NOT_BUILT] Index not built"));

        let built = run(&registry, json!({"operation": "build_index"})).await;
        assert_eq!(built.output.as_text(), Some("Index built with 1 vectors"));

        let stats = run(&registry, json!({"operation": "stats"})).await;
        let stats = stats.output.as_json().unwrap().clone();
        assert_eq!(stats["backend"], "offline");
        assert_eq!(stats["index"]["state"], "built");
        assert_eq!(stats["index"]["dirty"], false);
    }

    #[tokio::test]
    async fn get_and_delete_documents() {
        let tool = tool(BackendConfig::Memory);
        let id = Uuid::now_v7();
        tool.invoke(
            id,
            json!({"operation": "add_documents", "documents": [
                {"id": "a", "content": "alpha", "embedding": [1.0, 0.0, 0.0]}
            ]}),
        )
        .await;

        let fetched = tool
            .invoke(id, json!({"operation": "get_documents", "ids": ["a", "zzz"]}))
            .await;
        assert_eq!(fetched.output.as_json().unwrap().as_array().unwrap().len(), 1);

        let deleted = tool
            .invoke(id, json!({"operation": "delete_documents", "ids": ["a"]}))
            .await;
        assert!(deleted.success);
        assert_eq!(tool.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn null_or_missing_lists_are_empty_operations() {
        let registry = registry(BackendConfig::Memory);

        for arguments in [
            json!({"operation": "add_documents", "documents": null}),
            json!({"operation": "add_documents"}),
        ] {
            let result = run(&registry, arguments).await;
            assert!(result.success, "{:?}", result.error);
            assert_eq!(
                result.output.as_json().unwrap(),
                &json!({"count": 0, "ids": []})
            );
        }

        let fetched = run(&registry, json!({"operation": "get_documents", "ids": null})).await;
        assert_eq!(fetched.output.as_json().unwrap(), &json!([]));

        let deleted = run(&registry, json!({"operation": "delete_documents"})).await;
        assert_eq!(deleted.output.as_json().unwrap(), &json!({"requested": 0}));
    }

    #[tokio::test]
    async fn malformed_arguments_fail_cleanly() {
        let registry = registry(BackendConfig::Memory);
        let result = run(
            &registry,
            json!({"operation": "add_documents", "documents": "not a list"}),
        )
        .await;
        assert!(!result.success);
        assert!(result.error.unwrap().starts_with("invalid arguments"));
    }
}
