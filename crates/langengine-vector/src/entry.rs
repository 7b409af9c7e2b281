//! Stored vector records and the ordered set local engines keep them in.

use std::collections::{BTreeMap, HashMap};

use langengine_core::Metadata;
use serde::{Deserialize, Serialize};

use crate::metric::DistanceMetric;

/// A document as held by an engine: id, content, vector and metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorEntry {
    /// Unique identifier.
    pub id: String,
    /// Page content.
    pub content: String,
    /// The embedding vector.
    pub vector: Vec<f32>,
    /// Associated metadata.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: Metadata,
}

impl VectorEntry {
    /// Creates an entry without metadata.
    pub fn new(id: impl Into<String>, content: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            vector,
            metadata: Metadata::new(),
        }
    }

    /// Sets the metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Returns true if every filter field equals the entry's metadata value.
    pub fn matches(&self, filter: &Metadata) -> bool {
        matches_filter(&self.metadata, filter)
    }
}

pub(crate) fn matches_filter(metadata: &Metadata, filter: &Metadata) -> bool {
    filter
        .iter()
        .all(|(key, expected)| metadata.get(key) == Some(expected))
}

/// Parameters handed to [`VectorBackend::search`](crate::VectorBackend::search).
#[derive(Debug, Clone)]
pub struct SearchParams {
    /// Query vector, already validated against the store dimension.
    pub vector: Vec<f32>,
    /// Maximum number of candidates to return.
    pub limit: usize,
    /// Metadata equality filter; empty means no filter.
    pub filter: Metadata,
    /// Whether candidates should carry their vectors.
    pub include_vectors: bool,
}

/// A raw engine hit, before threshold filtering and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    /// Document id.
    pub id: String,
    /// Page content.
    pub content: String,
    /// Stored vector, when requested and available.
    pub vector: Option<Vec<f32>>,
    /// Associated metadata.
    pub metadata: Metadata,
    /// Distance to the query; lower is closer.
    pub distance: f32,
}

/// Insertion-ordered set of entries keyed by id.
///
/// Overwriting an id keeps its original position so that equal distances
/// resolve in first-insertion order. Every write stamps the id with a fresh
/// revision, so a clone of the set can tell which of its entries still match
/// the current contents.
#[derive(Debug, Clone, Default)]
pub(crate) struct EntrySet {
    entries: BTreeMap<u64, VectorEntry>,
    positions: HashMap<String, Slot>,
    next: u64,
    next_revision: u64,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    seq: u64,
    revision: u64,
}

impl EntrySet {
    pub fn from_entries(entries: impl IntoIterator<Item = VectorEntry>) -> Self {
        let mut set = Self::default();
        for entry in entries {
            set.upsert(entry);
        }
        set
    }

    pub fn upsert(&mut self, entry: VectorEntry) {
        let revision = self.next_revision;
        self.next_revision += 1;

        if let Some(slot) = self.positions.get_mut(&entry.id) {
            slot.revision = revision;
            self.entries.insert(slot.seq, entry);
            return;
        }
        let seq = self.next;
        self.next += 1;
        self.positions.insert(entry.id.clone(), Slot { seq, revision });
        self.entries.insert(seq, entry);
    }

    pub fn remove(&mut self, id: &str) -> bool {
        match self.positions.remove(id) {
            Some(slot) => self.entries.remove(&slot.seq).is_some(),
            None => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&VectorEntry> {
        self.positions.get(id).and_then(|slot| self.entries.get(&slot.seq))
    }

    /// Returns the revision of the last write to `id`.
    pub fn revision(&self, id: &str) -> Option<u64> {
        self.positions.get(id).map(|slot| slot.revision)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VectorEntry> {
        self.entries.values()
    }

    /// Exact search over every entry accepted by `keep`, which receives the
    /// id and its revision in this set.
    pub fn search(
        &self,
        params: &SearchParams,
        metric: DistanceMetric,
        keep: impl Fn(&str, u64) -> bool,
    ) -> Vec<Candidate> {
        let mut candidates: Vec<Candidate> = self
            .iter()
            .filter(|entry| {
                self.revision(&entry.id)
                    .is_some_and(|revision| keep(&entry.id, revision))
            })
            .filter(|entry| entry.matches(&params.filter))
            .map(|entry| Candidate {
                id: entry.id.clone(),
                content: entry.content.clone(),
                vector: params.include_vectors.then(|| entry.vector.clone()),
                metadata: entry.metadata.clone(),
                distance: metric.distance(&params.vector, &entry.vector),
            })
            .collect();

        candidates.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        candidates.truncate(params.limit);
        candidates
    }
}
