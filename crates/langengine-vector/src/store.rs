//! The generic similarity-search adapter and the backend trait.

use std::collections::HashMap;

use async_trait::async_trait;
use langengine_core::Document;
use langengine_core::Metadata;
use langengine_core::emb::EmbeddingService;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display};

use crate::TRACING_TARGET;
use crate::config::{BackendConfig, VectorStoreConfig};
use crate::entry::{Candidate, SearchParams, VectorEntry, matches_filter};
use crate::error::{VectorError, VectorResult};
use crate::memory::MemoryBackend;
use crate::metric::DistanceMetric;
use crate::offline::OfflineBackend;
use crate::supabase::SupabaseBackend;

/// Lifecycle of an engine that requires an explicit build step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[derive(AsRefStr, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum IndexState {
    /// No index has been built or loaded yet.
    Created,
    /// An index was built from the live vectors.
    Built,
    /// An index was loaded from persistent storage.
    Loaded,
}

/// Index state plus whether the live vectors changed since the last
/// build or load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStatus {
    /// Current lifecycle state.
    pub state: IndexState,
    /// True when inserts or deletes happened after the last build or load.
    pub dirty: bool,
}

/// Trait implemented by every vector engine.
///
/// Engines receive vectors that were already validated against the store
/// dimension. Engines that search immediately after insert keep the default
/// no-op `build_index` and `load_index`.
#[async_trait]
pub trait VectorBackend: Send + Sync {
    /// Returns the engine name.
    fn name(&self) -> &'static str;

    /// Inserts or overwrites entries by id.
    async fn upsert(&self, entries: Vec<VectorEntry>) -> VectorResult<()>;

    /// Returns up to `params.limit` candidates ordered by ascending distance.
    async fn search(&self, params: &SearchParams) -> VectorResult<Vec<Candidate>>;

    /// Returns the stored entries for the given ids; unknown ids are skipped.
    async fn get(&self, ids: &[String]) -> VectorResult<Vec<VectorEntry>>;

    /// Deletes entries by id; unknown ids are ignored.
    async fn delete(&self, ids: &[String]) -> VectorResult<()>;

    /// Returns the number of live entries.
    async fn count(&self) -> VectorResult<usize>;

    /// Builds the search index from the live entries.
    async fn build_index(&self) -> VectorResult<()> {
        Ok(())
    }

    /// Loads a previously persisted index.
    async fn load_index(&self) -> VectorResult<()> {
        Ok(())
    }

    /// Returns the index status for engines with an explicit build step.
    async fn index_status(&self) -> Option<IndexStatus> {
        None
    }
}

/// What to search for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SearchQuery {
    /// A raw query vector.
    Vector(Vec<f32>),
    /// Text embedded through the store's embedding service.
    Text(String),
}

/// A similarity search request.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    /// The query.
    pub query: SearchQuery,
    /// Maximum number of results.
    pub k: usize,
    /// Keep only results with `distance <= max_distance`.
    pub max_distance: Option<f32>,
    /// Metadata equality filter.
    pub filter: Metadata,
    /// Return stored vectors alongside results.
    pub include_vectors: bool,
}

impl SearchRequest {
    /// Creates a request for the `k` nearest neighbours of `query`.
    pub fn new(query: SearchQuery, k: usize) -> Self {
        Self {
            query,
            k,
            max_distance: None,
            filter: Metadata::new(),
            include_vectors: false,
        }
    }

    /// Creates a text query.
    pub fn text(text: impl Into<String>, k: usize) -> Self {
        Self::new(SearchQuery::Text(text.into()), k)
    }

    /// Creates a vector query.
    pub fn vector(vector: Vec<f32>, k: usize) -> Self {
        Self::new(SearchQuery::Vector(vector), k)
    }

    /// Sets a distance threshold.
    pub fn with_max_distance(mut self, max_distance: f32) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Adds a metadata equality constraint.
    pub fn with_filter(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.filter.insert(key.into(), value);
        self
    }

    /// Requests stored vectors in results.
    pub fn with_vectors(mut self) -> Self {
        self.include_vectors = true;
        self
    }
}

/// One search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Document id.
    pub id: String,
    /// Distance to the query; lower is closer.
    pub distance: f32,
    /// Similarity derived from the distance by the store metric.
    pub similarity: f32,
    /// Page content.
    pub content: String,
    /// The stored vector (if requested).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    /// Associated metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
}

impl SearchResult {
    fn from_candidate(candidate: Candidate, metric: DistanceMetric) -> Self {
        Self {
            similarity: metric.similarity(candidate.distance),
            id: candidate.id,
            distance: candidate.distance,
            content: candidate.content,
            vector: candidate.vector,
            metadata: candidate.metadata,
        }
    }

    /// Converts the hit into a document scored by distance.
    pub fn into_document(self) -> Document {
        Document {
            id: Some(self.id),
            content: self.content,
            embedding: self.vector,
            metadata: self.metadata,
            score: Some(self.distance),
        }
    }
}

/// Store configuration and size summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreStats {
    /// Engine name.
    pub backend: String,
    /// Vector dimension.
    pub dimension: usize,
    /// Distance metric.
    pub metric: DistanceMetric,
    /// Number of live entries.
    pub count: usize,
    /// Index status for engines with an explicit build step.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<IndexStatus>,
    /// Whether text can be embedded.
    pub has_embedder: bool,
}

/// Similarity-search adapter over a [`VectorBackend`].
pub struct VectorStore {
    config: VectorStoreConfig,
    backend: Box<dyn VectorBackend>,
    embedder: Option<EmbeddingService>,
}

impl VectorStore {
    /// Creates a store with one of the bundled engines.
    pub fn new(config: VectorStoreConfig, backend: BackendConfig) -> VectorResult<Self> {
        config.validate()?;
        let engine: Box<dyn VectorBackend> = match &backend {
            BackendConfig::Memory => Box::new(MemoryBackend::new(config.metric())),
            BackendConfig::Offline(cfg) => Box::new(OfflineBackend::new(&config, cfg.clone())),
            BackendConfig::Supabase(cfg) => Box::new(SupabaseBackend::new(&config, cfg)?),
        };

        tracing::info!(
            target: TRACING_TARGET,
            backend = %backend.backend_name(),
            dimension = config.dimension(),
            metric = %config.metric(),
            "Vector store initialized"
        );

        Ok(Self {
            config,
            backend: engine,
            embedder: None,
        })
    }

    /// Creates a store over a custom engine.
    pub fn with_backend(config: VectorStoreConfig, backend: impl VectorBackend + 'static) -> Self {
        Self {
            config,
            backend: Box::new(backend),
            embedder: None,
        }
    }

    /// Attaches the embedding service used for text documents and queries.
    pub fn with_embedder(mut self, embedder: EmbeddingService) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Returns the store configuration.
    pub fn config(&self) -> &VectorStoreConfig {
        &self.config
    }

    /// Returns the engine name.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Embeds, validates and writes documents, returning their ids in input
    /// order.
    ///
    /// Documents with blank content are skipped. Nothing is written unless
    /// every vector matches the configured dimension. Repeated ids overwrite
    /// earlier ones.
    pub async fn add_documents(&self, documents: Vec<Document>) -> VectorResult<Vec<String>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let total = documents.len();
        let mut documents: Vec<Document> = documents
            .into_iter()
            .filter(|doc| {
                if !doc.has_content() {
                    tracing::warn!(
                        target: TRACING_TARGET,
                        id = ?doc.id,
                        "Skipping document with blank content"
                    );
                }
                doc.has_content()
            })
            .collect();

        if documents.is_empty() {
            return Ok(Vec::new());
        }

        self.embed_missing(&mut documents).await?;

        let dimension = self.config.dimension();
        let mut entries: Vec<VectorEntry> = Vec::with_capacity(documents.len());
        let mut ids = Vec::with_capacity(documents.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for doc in documents {
            let vector = doc
                .embedding
                .ok_or_else(|| VectorError::embedding("document has no embedding"))?;
            if vector.len() != dimension {
                return Err(VectorError::dimension_mismatch(dimension, vector.len()));
            }

            let id = doc
                .id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
            let entry = VectorEntry {
                id: id.clone(),
                content: doc.content,
                vector,
                metadata: doc.metadata,
            };

            match positions.get(&id) {
                Some(&index) => entries[index] = entry,
                None => {
                    positions.insert(id.clone(), entries.len());
                    entries.push(entry);
                }
            }
            ids.push(id);
        }

        tracing::debug!(
            target: TRACING_TARGET,
            backend = self.backend.name(),
            received = total,
            written = entries.len(),
            "Upserting documents"
        );

        self.backend.upsert(entries).await?;
        Ok(ids)
    }

    async fn embed_missing(&self, documents: &mut [Document]) -> VectorResult<()> {
        let pending: Vec<usize> = documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| doc.embedding.is_none())
            .map(|(index, _)| index)
            .collect();

        if pending.is_empty() {
            return Ok(());
        }

        let embedder = self.embedder.as_ref().ok_or_else(|| {
            VectorError::embedding("no embedding service configured for documents without vectors")
        })?;

        for batch in pending.chunks(self.config.batch_size()) {
            let texts: Vec<String> = batch
                .iter()
                .map(|&index| documents[index].content.clone())
                .collect();

            tracing::debug!(
                target: TRACING_TARGET,
                batch_size = texts.len(),
                "Embedding document batch"
            );

            let vectors = embedder.embed_texts(texts).await?;
            if vectors.len() != batch.len() {
                return Err(VectorError::embedding(format!(
                    "expected {} embeddings, got {}",
                    batch.len(),
                    vectors.len()
                )));
            }

            for (&index, vector) in batch.iter().zip(vectors) {
                documents[index].embedding = Some(vector);
            }
        }

        Ok(())
    }

    /// Builds the engine index; a no-op for incremental engines.
    pub async fn build_index(&self) -> VectorResult<()> {
        tracing::debug!(target: TRACING_TARGET, backend = self.backend.name(), "Building index");
        self.backend.build_index().await
    }

    /// Loads a persisted engine index; a no-op for incremental engines.
    pub async fn load_index(&self) -> VectorResult<()> {
        tracing::debug!(target: TRACING_TARGET, backend = self.backend.name(), "Loading index");
        self.backend.load_index().await
    }

    /// Returns the `k` closest documents, ordered by ascending distance.
    pub async fn similarity_search(&self, request: SearchRequest) -> VectorResult<Vec<SearchResult>> {
        if request.k == 0 {
            return Ok(Vec::new());
        }

        let dimension = self.config.dimension();
        let vector = match request.query {
            SearchQuery::Vector(vector) => vector,
            SearchQuery::Text(text) => {
                let embedder = self.embedder.as_ref().ok_or_else(|| {
                    VectorError::embedding("no embedding service configured for text queries")
                })?;
                embedder.embed_query(&text).await?
            }
        };

        if vector.len() != dimension {
            return Err(VectorError::query_dimension_mismatch(dimension, vector.len()));
        }

        tracing::debug!(
            target: TRACING_TARGET,
            backend = self.backend.name(),
            k = request.k,
            max_distance = ?request.max_distance,
            filters = request.filter.len(),
            "Searching vectors"
        );

        let params = SearchParams {
            vector,
            limit: request.k,
            filter: request.filter,
            include_vectors: request.include_vectors,
        };
        let candidates = self.backend.search(&params).await?;

        let metric = self.config.metric();
        let mut results: Vec<SearchResult> = candidates
            .into_iter()
            .filter(|c| request.max_distance.is_none_or(|max| c.distance <= max))
            .filter(|c| matches_filter(&c.metadata, &params.filter))
            .map(|c| SearchResult::from_candidate(c, metric))
            .collect();

        results.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        results.truncate(request.k);
        Ok(results)
    }

    /// Returns stored documents by id; unknown ids are skipped.
    pub async fn get_documents(&self, ids: &[String]) -> VectorResult<Vec<Document>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let entries = self.backend.get(ids).await?;
        Ok(entries
            .into_iter()
            .map(|entry| Document {
                id: Some(entry.id),
                content: entry.content,
                embedding: Some(entry.vector),
                metadata: entry.metadata,
                score: None,
            })
            .collect())
    }

    /// Deletes documents by id; unknown ids are ignored.
    pub async fn delete_documents(&self, ids: &[String]) -> VectorResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        tracing::debug!(
            target: TRACING_TARGET,
            backend = self.backend.name(),
            count = ids.len(),
            "Deleting documents"
        );
        self.backend.delete(ids).await
    }

    /// Returns the number of live documents.
    pub async fn count(&self) -> VectorResult<usize> {
        self.backend.count().await
    }

    /// Returns the index status for engines with an explicit build step.
    pub async fn index_status(&self) -> Option<IndexStatus> {
        self.backend.index_status().await
    }

    /// Returns the index lifecycle state; `None` for incremental engines.
    pub async fn state(&self) -> Option<IndexState> {
        self.backend.index_status().await.map(|status| status.state)
    }

    /// Returns a summary of the store.
    pub async fn stats(&self) -> VectorResult<StoreStats> {
        Ok(StoreStats {
            backend: self.backend.name().to_owned(),
            dimension: self.config.dimension(),
            metric: self.config.metric(),
            count: self.backend.count().await?,
            index: self.backend.index_status().await,
            has_embedder: self.embedder.is_some(),
        })
    }
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("backend", &self.backend.name())
            .field("config", &self.config)
            .field("has_embedder", &self.embedder.is_some())
            .finish()
    }
}
