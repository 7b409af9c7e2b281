//! In-memory vector engine with incremental insert.
//!
//! Vectors are searchable as soon as they are written; search is an exact
//! scan over the live set.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::TRACING_TARGET;
use crate::entry::{Candidate, EntrySet, SearchParams, VectorEntry};
use crate::error::VectorResult;
use crate::metric::DistanceMetric;
use crate::store::VectorBackend;

/// Incremental in-memory backend.
pub struct MemoryBackend {
    metric: DistanceMetric,
    entries: RwLock<EntrySet>,
}

impl MemoryBackend {
    /// Creates an empty backend comparing vectors with `metric`.
    pub fn new(metric: DistanceMetric) -> Self {
        tracing::debug!(
            target: TRACING_TARGET,
            metric = %metric,
            "Memory backend initialized"
        );

        Self {
            metric,
            entries: RwLock::new(EntrySet::default()),
        }
    }
}

#[async_trait]
impl VectorBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn upsert(&self, entries: Vec<VectorEntry>) -> VectorResult<()> {
        let mut set = self.entries.write().await;
        for entry in entries {
            set.upsert(entry);
        }
        Ok(())
    }

    async fn search(&self, params: &SearchParams) -> VectorResult<Vec<Candidate>> {
        let set = self.entries.read().await;
        Ok(set.search(params, self.metric, |_, _| true))
    }

    async fn get(&self, ids: &[String]) -> VectorResult<Vec<VectorEntry>> {
        let set = self.entries.read().await;
        Ok(ids.iter().filter_map(|id| set.get(id).cloned()).collect())
    }

    async fn delete(&self, ids: &[String]) -> VectorResult<()> {
        let mut set = self.entries.write().await;
        for id in ids {
            set.remove(id);
        }
        Ok(())
    }

    async fn count(&self) -> VectorResult<usize> {
        Ok(self.entries.read().await.len())
    }
}

#[cfg(test)]
mod tests {
    use langengine_core::Metadata;

    use super::*;

    fn params(vector: Vec<f32>, limit: usize) -> SearchParams {
        SearchParams {
            vector,
            limit,
            filter: Metadata::new(),
            include_vectors: true,
        }
    }

    #[tokio::test]
    async fn searchable_immediately_after_insert() {
        let backend = MemoryBackend::new(DistanceMetric::Euclidean);
        backend
            .upsert(vec![VectorEntry::new("a", "alpha", vec![0.0, 1.0])])
            .await
            .unwrap();

        let hits = backend.search(&params(vec![0.0, 1.0], 3)).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].vector, Some(vec![0.0, 1.0]));
        assert!(backend.index_status().await.is_none());
        backend.build_index().await.unwrap();
    }

    #[tokio::test]
    async fn get_skips_unknown_ids() {
        let backend = MemoryBackend::new(DistanceMetric::Cosine);
        backend
            .upsert(vec![VectorEntry::new("a", "alpha", vec![1.0])])
            .await
            .unwrap();

        let found = backend
            .get(&["missing".to_owned(), "a".to_owned()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
    }
}
