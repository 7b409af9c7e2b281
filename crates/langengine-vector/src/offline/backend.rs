//! Offline engine implementation.

use std::io::ErrorKind;
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::OfflineConfig;
use crate::TRACING_TARGET;
use crate::config::VectorStoreConfig;
use crate::entry::{Candidate, EntrySet, SearchParams, VectorEntry};
use crate::error::{VectorError, VectorResult};
use crate::metric::DistanceMetric;
use crate::store::{IndexState, IndexStatus, VectorBackend};

const INDEX_FORMAT_VERSION: u32 = 1;

/// On-disk index layout.
#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    version: u32,
    dimension: usize,
    metric: DistanceMetric,
    entries: Vec<VectorEntry>,
}

struct OfflineState {
    live: EntrySet,
    snapshot: Option<EntrySet>,
    state: IndexState,
    dirty: bool,
}

/// Engine that searches an explicitly built snapshot of its vectors.
///
/// Inserts and deletes update the live set and mark the index dirty; the
/// snapshot changes only on `build_index` or `load_index`. Searches run
/// against the snapshot restricted to entries the live set has not rewritten
/// or deleted since.
pub struct OfflineBackend {
    dimension: usize,
    metric: DistanceMetric,
    config: OfflineConfig,
    state: RwLock<OfflineState>,
}

impl OfflineBackend {
    /// Creates an empty engine in the `Created` state.
    pub fn new(store: &VectorStoreConfig, config: OfflineConfig) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            dimension = store.dimension(),
            index_path = ?config.index_path(),
            "Offline backend initialized"
        );

        Self {
            dimension: store.dimension(),
            metric: store.metric(),
            config,
            state: RwLock::new(OfflineState {
                live: EntrySet::default(),
                snapshot: None,
                state: IndexState::Created,
                dirty: false,
            }),
        }
    }

    async fn persist(&self, path: &Path, snapshot: &EntrySet) -> VectorResult<()> {
        let index = PersistedIndex {
            version: INDEX_FORMAT_VERSION,
            dimension: self.dimension,
            metric: self.metric,
            entries: snapshot.iter().cloned().collect(),
        };
        let bytes = serde_json::to_vec(&index)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Atomic replace.
        let tmp = path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

#[async_trait]
impl VectorBackend for OfflineBackend {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn upsert(&self, entries: Vec<VectorEntry>) -> VectorResult<()> {
        let mut state = self.state.write().await;
        for entry in entries {
            state.live.upsert(entry);
        }
        state.dirty = true;
        Ok(())
    }

    async fn search(&self, params: &SearchParams) -> VectorResult<Vec<Candidate>> {
        let state = self.state.read().await;
        if state.live.is_empty() {
            return Ok(Vec::new());
        }

        let snapshot = state.snapshot.as_ref().ok_or(VectorError::IndexNotBuilt)?;
        if state.dirty {
            tracing::debug!(
                target: TRACING_TARGET,
                "Searching a stale index, rebuild to include recent inserts"
            );
        }

        // Only entries unchanged since the snapshot; rewritten or deleted ids
        // stay hidden until the next build.
        Ok(snapshot.search(params, self.metric, |id, revision| {
            state.live.revision(id) == Some(revision)
        }))
    }

    async fn get(&self, ids: &[String]) -> VectorResult<Vec<VectorEntry>> {
        let state = self.state.read().await;
        Ok(ids.iter().filter_map(|id| state.live.get(id).cloned()).collect())
    }

    async fn delete(&self, ids: &[String]) -> VectorResult<()> {
        let mut state = self.state.write().await;
        let mut removed = false;
        for id in ids {
            removed |= state.live.remove(id);
        }
        if removed {
            state.dirty = true;
        }
        Ok(())
    }

    async fn count(&self) -> VectorResult<usize> {
        Ok(self.state.read().await.live.len())
    }

    async fn build_index(&self) -> VectorResult<()> {
        let mut state = self.state.write().await;
        if state.live.is_empty() {
            return Err(VectorError::NoVectors);
        }

        let snapshot = state.live.clone();
        if let Some(path) = self.config.index_path() {
            self.persist(path, &snapshot).await?;
        }

        tracing::info!(
            target: TRACING_TARGET,
            vectors = snapshot.len(),
            persisted = self.config.index_path().is_some(),
            "Index built"
        );

        state.snapshot = Some(snapshot);
        state.state = IndexState::Built;
        state.dirty = false;
        Ok(())
    }

    async fn load_index(&self) -> VectorResult<()> {
        let path = self
            .config
            .index_path()
            .ok_or_else(|| VectorError::index_not_found("no index path configured"))?;

        let mut state = self.state.write().await;
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(VectorError::index_not_found(path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        let index: PersistedIndex = serde_json::from_slice(&bytes)?;
        if index.version > INDEX_FORMAT_VERSION {
            return Err(VectorError::serialization(format!(
                "unsupported index format version {}",
                index.version
            )));
        }
        if index.dimension != self.dimension {
            return Err(VectorError::dimension_mismatch(self.dimension, index.dimension));
        }
        if let Some(entry) = index.entries.iter().find(|e| e.vector.len() != self.dimension) {
            return Err(VectorError::dimension_mismatch(self.dimension, entry.vector.len()));
        }
        if index.metric != self.metric {
            tracing::warn!(
                target: TRACING_TARGET,
                persisted = %index.metric,
                configured = %self.metric,
                "Loaded index was built with a different metric"
            );
        }

        let snapshot = EntrySet::from_entries(index.entries);
        tracing::info!(
            target: TRACING_TARGET,
            vectors = snapshot.len(),
            path = %path.display(),
            "Index loaded"
        );

        state.live = snapshot.clone();
        state.snapshot = Some(snapshot);
        state.state = IndexState::Loaded;
        state.dirty = false;
        Ok(())
    }

    async fn index_status(&self) -> Option<IndexStatus> {
        let state = self.state.read().await;
        Some(IndexStatus {
            state: state.state,
            dirty: state.dirty,
        })
    }
}
