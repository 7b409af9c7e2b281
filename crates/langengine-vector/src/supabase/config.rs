//! Supabase configuration.

#[cfg(feature = "config")]
use clap::Args;
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::error::{VectorError, VectorResult};

/// Default table documents are stored in.
pub const DEFAULT_TABLE: &str = "documents";

/// Default similarity search function.
pub const DEFAULT_QUERY_NAME: &str = "match_documents";

/// Supabase configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyz.supabase.co`.
    #[cfg_attr(
        feature = "config",
        arg(id = "supabase_url", long = "supabase-url", env = "SUPABASE_URL", default_value = "")
    )]
    pub url: String,

    /// Service or anon API key.
    #[cfg_attr(
        feature = "config",
        arg(
            id = "supabase_api_key",
            long = "supabase-api-key",
            env = "SUPABASE_API_KEY",
            default_value = "",
            hide_env_values = true
        )
    )]
    pub api_key: String,

    /// Table holding the documents.
    #[cfg_attr(
        feature = "config",
        arg(id = "supabase_table", long = "supabase-table", env = "SUPABASE_TABLE", default_value = DEFAULT_TABLE)
    )]
    #[serde(default = "default_table")]
    pub table: String,

    /// Remote procedure performing the similarity search.
    ///
    /// It receives `query_embedding`, `match_count` and an optional `filter`
    /// and must return rows with a `similarity` column on the store metric's
    /// scale: `1 - distance` for cosine and inner product, `1 / (1 + d)` for
    /// euclidean and manhattan. The stock `match_documents` function returns
    /// cosine similarity, so other metrics need a matching function.
    #[cfg_attr(
        feature = "config",
        arg(id = "supabase_query_name", long = "supabase-query-name", env = "SUPABASE_QUERY_NAME", default_value = DEFAULT_QUERY_NAME)
    )]
    #[serde(default = "default_query_name")]
    pub query_name: String,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_owned()
}

fn default_query_name() -> String {
    DEFAULT_QUERY_NAME.to_owned()
}

impl std::fmt::Debug for SupabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseConfig")
            .field("url", &self.url)
            .field("api_key", &"<redacted>")
            .field("table", &self.table)
            .field("query_name", &self.query_name)
            .finish()
    }
}

impl SupabaseConfig {
    /// Creates a configuration with the default table and search function.
    pub fn new(url: impl Into<String>, api_key: impl Into<String>) -> VectorResult<Self> {
        let config = Self {
            url: url.into(),
            api_key: api_key.into(),
            table: default_table(),
            query_name: default_query_name(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the table name.
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    /// Sets the search function name.
    pub fn with_query_name(mut self, query_name: impl Into<String>) -> Self {
        self.query_name = query_name.into();
        self
    }

    /// Checks that every required field is present.
    pub fn validate(&self) -> VectorResult<()> {
        if self.url.trim().is_empty() {
            return Err(VectorError::invalid_config("Supabase URL is required"));
        }
        if self.api_key.trim().is_empty() {
            return Err(VectorError::invalid_config("Supabase API key is required"));
        }
        if self.table.trim().is_empty() || self.query_name.trim().is_empty() {
            return Err(VectorError::invalid_config(
                "Supabase table and query name must not be empty",
            ));
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), but logs the problem and returns
    /// `false` instead of failing.
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: TRACING_TARGET, error = %e, "Invalid Supabase configuration");
                false
            }
        }
    }
}
