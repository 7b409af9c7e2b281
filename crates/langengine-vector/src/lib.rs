#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

pub mod memory;
pub mod offline;
pub mod supabase;

mod config;
mod entry;
mod error;
mod metric;
mod store;

pub use config::{
    BackendConfig, DEFAULT_BATCH_SIZE, FieldMapping, OfflineConfig, SupabaseConfig,
    VectorStoreConfig,
};
pub use entry::{Candidate, SearchParams, VectorEntry};
pub use error::{VectorError, VectorResult};
pub use metric::DistanceMetric;
pub use store::{
    IndexState, IndexStatus, SearchQuery, SearchRequest, SearchResult, StoreStats, VectorBackend,
    VectorStore,
};

/// Tracing target for vector store operations.
pub const TRACING_TARGET: &str = "langengine_vector";
