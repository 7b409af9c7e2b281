//! Vector store configuration types.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::error::{VectorError, VectorResult};
use crate::metric::DistanceMetric;
pub use crate::offline::OfflineConfig;
pub use crate::supabase::SupabaseConfig;

/// Default number of texts embedded per provider call.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Engine-independent store configuration.
///
/// Built through [`VectorStoreConfig::new`], which rejects a zero dimension;
/// the dimension is fixed for the lifetime of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct VectorStoreConfig {
    /// Dimension of every stored vector.
    #[cfg_attr(
        feature = "config",
        arg(long = "vector-dimension", env = "VECTOR_DIMENSION", default_value = "1536")
    )]
    dimension: usize,

    /// Distance metric.
    #[cfg_attr(
        feature = "config",
        arg(long = "vector-metric", env = "VECTOR_METRIC", default_value = "cosine")
    )]
    #[serde(default)]
    metric: DistanceMetric,

    /// Record field names used by remote engines.
    #[cfg_attr(feature = "config", command(flatten))]
    #[serde(default)]
    fields: FieldMapping,

    /// Texts embedded per provider call.
    #[cfg_attr(
        feature = "config",
        arg(long = "vector-batch-size", env = "VECTOR_BATCH_SIZE", default_value = "32")
    )]
    #[serde(default = "default_batch_size")]
    batch_size: usize,
}

fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}

impl VectorStoreConfig {
    /// Creates a configuration for vectors of `dimension` compared by `metric`.
    pub fn new(dimension: usize, metric: DistanceMetric) -> VectorResult<Self> {
        let config = Self {
            dimension,
            metric,
            fields: FieldMapping::default(),
            batch_size: DEFAULT_BATCH_SIZE,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the field mapping.
    pub fn with_fields(mut self, fields: FieldMapping) -> Self {
        self.fields = fields;
        self
    }

    /// Sets the embedding batch size.
    pub fn with_batch_size(mut self, batch_size: usize) -> VectorResult<Self> {
        self.batch_size = batch_size;
        self.validate()?;
        Ok(self)
    }

    /// Checks the invariants of a configuration obtained by other means
    /// (deserialization, command-line parsing).
    pub fn validate(&self) -> VectorResult<()> {
        if self.dimension == 0 {
            return Err(VectorError::invalid_config("dimension must be positive"));
        }
        if self.batch_size == 0 {
            return Err(VectorError::invalid_config("batch size must be positive"));
        }
        self.fields.validate()
    }

    /// Returns the vector dimension.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Returns the distance metric.
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Returns the field mapping.
    pub fn fields(&self) -> &FieldMapping {
        &self.fields
    }

    /// Returns the embedding batch size.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

/// Names of the record fields an engine stores documents under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
#[serde(default)]
pub struct FieldMapping {
    /// Identifier field.
    #[cfg_attr(
        feature = "config",
        arg(long = "vector-id-field", env = "VECTOR_ID_FIELD", default_value = "id")
    )]
    pub id: String,

    /// Page content field.
    #[cfg_attr(
        feature = "config",
        arg(long = "vector-content-field", env = "VECTOR_CONTENT_FIELD", default_value = "content")
    )]
    pub content: String,

    /// Embedding field.
    #[cfg_attr(
        feature = "config",
        arg(long = "vector-embedding-field", env = "VECTOR_EMBEDDING_FIELD", default_value = "embedding")
    )]
    pub vector: String,

    /// Metadata field.
    #[cfg_attr(
        feature = "config",
        arg(long = "vector-metadata-field", env = "VECTOR_METADATA_FIELD", default_value = "metadata")
    )]
    pub metadata: String,
}

impl Default for FieldMapping {
    fn default() -> Self {
        Self {
            id: "id".into(),
            content: "content".into(),
            vector: "embedding".into(),
            metadata: "metadata".into(),
        }
    }
}

impl FieldMapping {
    fn validate(&self) -> VectorResult<()> {
        let names = [&self.id, &self.content, &self.vector, &self.metadata];
        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(VectorError::invalid_config("field names must not be empty"));
        }
        Ok(())
    }
}

/// Engine selection and engine-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum BackendConfig {
    /// Incremental in-memory engine.
    Memory,
    /// Build-then-search engine with optional file persistence.
    Offline(OfflineConfig),
    /// Supabase (PostgREST) table plus match function.
    Supabase(SupabaseConfig),
}

impl BackendConfig {
    /// Returns the backend name as a static string.
    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Offline(_) => "offline",
            Self::Supabase(_) => "supabase",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_dimension() {
        assert!(matches!(
            VectorStoreConfig::new(0, DistanceMetric::Cosine),
            Err(VectorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_zero_batch_size() {
        let config = VectorStoreConfig::new(3, DistanceMetric::Cosine).unwrap();
        assert!(config.with_batch_size(0).is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: VectorStoreConfig =
            serde_json::from_str(r#"{"dimension": 4, "metric": "l2"}"#).unwrap();
        assert_eq!(config.metric(), DistanceMetric::Euclidean);
        assert_eq!(config.batch_size(), DEFAULT_BATCH_SIZE);
        assert_eq!(config.fields().vector, "embedding");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn backend_config_is_tagged() {
        let config: BackendConfig = serde_json::from_str(r#"{"type": "memory"}"#).unwrap();
        assert_eq!(config.backend_name(), "memory");
    }
}
