//! Offline engine configuration.

use std::path::{Path, PathBuf};

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

/// Offline engine configuration.
///
/// Without an index path, builds only snapshot in memory and loads fail
/// with `IndexNotFound`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct OfflineConfig {
    /// File the built index is persisted to and loaded from.
    #[cfg_attr(feature = "config", arg(long = "vector-index-path", env = "VECTOR_INDEX_PATH"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,
}

impl OfflineConfig {
    /// Creates a configuration persisting to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            index_path: Some(path.into()),
        }
    }

    /// Returns the index path, if configured.
    pub fn index_path(&self) -> Option<&Path> {
        self.index_path.as_deref()
    }
}
