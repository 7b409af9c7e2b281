//! DashScope client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use langengine_http::{DEFAULT_MAX_RETRIES, HttpConfig};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::error::{Error, Result};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://dashscope.aliyuncs.com/compatible-mode/v1";

/// Default embedding model.
pub const DEFAULT_MODEL: &str = "text-embedding-v2";

/// Largest number of inputs sent in one request.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 10;

/// Configuration for [`DashScopeClient`](crate::DashScopeClient).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct DashScopeConfig {
    /// DashScope API key.
    #[cfg_attr(
        feature = "config",
        arg(
            id = "dashscope_api_key",
            long = "dashscope-api-key",
            env = "DASHSCOPE_API_KEY",
            default_value = "",
            hide_env_values = true
        )
    )]
    pub api_key: String,

    /// Embedding model name.
    #[cfg_attr(
        feature = "config",
        arg(id = "dashscope_model", long = "dashscope-model", env = "DASHSCOPE_MODEL", default_value = DEFAULT_MODEL)
    )]
    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the compatible-mode API.
    #[cfg_attr(
        feature = "config",
        arg(id = "dashscope_base_url", long = "dashscope-base-url", env = "DASHSCOPE_BASE_URL", default_value = DEFAULT_BASE_URL)
    )]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Requested output dimension, for models that support it.
    #[cfg_attr(
        feature = "config",
        arg(id = "dashscope_dimensions", long = "dashscope-dimensions", env = "DASHSCOPE_DIMENSIONS")
    )]
    #[serde(default)]
    pub dimensions: Option<u32>,

    /// Largest number of inputs per request.
    #[cfg_attr(
        feature = "config",
        arg(id = "dashscope_batch_size", long = "dashscope-batch-size", env = "DASHSCOPE_BATCH_SIZE", default_value_t = DEFAULT_MAX_BATCH_SIZE)
    )]
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(id = "dashscope_timeout", long = "dashscope-timeout", env = "DASHSCOPE_TIMEOUT", default_value_t = 30)
    )]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for rate-limited requests.
    #[cfg_attr(
        feature = "config",
        arg(id = "dashscope_max_retries", long = "dashscope-max-retries", env = "DASHSCOPE_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)
    )]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_model() -> String {
    DEFAULT_MODEL.to_owned()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_max_batch_size() -> usize {
    DEFAULT_MAX_BATCH_SIZE
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl std::fmt::Debug for DashScopeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashScopeConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("dimensions", &self.dimensions)
            .field("max_batch_size", &self.max_batch_size)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl DashScopeConfig {
    /// Creates a configuration with the default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let config = Self {
            api_key: api_key.into(),
            model: default_model(),
            base_url: default_base_url(),
            dimensions: None,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
            timeout_secs: default_timeout_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the embedding model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Requests vectors of the given dimension.
    pub fn with_dimensions(mut self, dimensions: u32) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    /// Sets the largest number of inputs per request.
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Sets the number of retries for rate-limited requests.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Checks that every required field is present.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(Error::config("DashScope API key is required"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("DashScope model must not be empty"));
        }
        if self.max_batch_size == 0 {
            return Err(Error::config("DashScope batch size must be positive"));
        }
        if self.dimensions == Some(0) {
            return Err(Error::config("DashScope dimensions must be positive"));
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), but logs the problem and returns
    /// `false` instead of failing.
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: TRACING_TARGET, error = %e, "Invalid DashScope configuration");
                false
            }
        }
    }

    /// Builds the HTTP configuration for this client.
    pub(crate) fn http_config(&self) -> Result<HttpConfig> {
        let config = HttpConfig::new(&self.base_url)?
            .with_bearer_token(self.api_key.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries);
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = DashScopeConfig::new("sk-test").unwrap();
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_batch_size, DEFAULT_MAX_BATCH_SIZE);
        assert!(config.dimensions.is_none());
        assert!(config.is_valid());
    }

    #[test]
    fn rejects_missing_key() {
        let err = DashScopeConfig::new("  ").unwrap_err();
        assert_eq!(err.code(), "DASHSCOPE_CONFIG_ERROR");
    }

    #[test]
    fn invalid_settings_are_reported() {
        let config = DashScopeConfig::new("sk-test").unwrap().with_max_batch_size(0);
        assert!(!config.is_valid());

        let config = DashScopeConfig::new("sk-test")
            .unwrap()
            .with_base_url("ftp://example.com");
        assert!(config.http_config().is_err());
    }

    #[test]
    fn debug_hides_key() {
        let config = DashScopeConfig::new("sk-secret").unwrap();
        assert!(!format!("{:?}", config).contains("sk-secret"));
    }
}
