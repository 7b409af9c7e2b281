//! Notion client configuration.

use std::time::Duration;

#[cfg(feature = "config")]
use clap::Args;
use langengine_http::{DEFAULT_MAX_RETRIES, HttpConfig};
use serde::{Deserialize, Serialize};

use crate::TRACING_TARGET;
use crate::error::{Error, Result};

/// Default API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.notion.com";

/// API version sent in the `Notion-Version` header.
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Configuration for [`NotionClient`](crate::NotionClient).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "config", derive(Args))]
pub struct NotionConfig {
    /// Internal integration token.
    #[cfg_attr(
        feature = "config",
        arg(
            id = "notion_api_key",
            long = "notion-api-key",
            env = "NOTION_API_KEY",
            default_value = "",
            hide_env_values = true
        )
    )]
    pub api_key: String,

    /// Base URL of the Notion API.
    #[cfg_attr(
        feature = "config",
        arg(id = "notion_base_url", long = "notion-base-url", env = "NOTION_BASE_URL", default_value = DEFAULT_BASE_URL)
    )]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Value of the `Notion-Version` header.
    #[cfg_attr(
        feature = "config",
        arg(id = "notion_version", long = "notion-version", env = "NOTION_VERSION", default_value = DEFAULT_NOTION_VERSION)
    )]
    #[serde(default = "default_version")]
    pub version: String,

    /// Request timeout in seconds.
    #[cfg_attr(
        feature = "config",
        arg(id = "notion_timeout", long = "notion-timeout", env = "NOTION_TIMEOUT", default_value_t = 30)
    )]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries for rate-limited requests.
    #[cfg_attr(
        feature = "config",
        arg(id = "notion_max_retries", long = "notion-max-retries", env = "NOTION_MAX_RETRIES", default_value_t = DEFAULT_MAX_RETRIES)
    )]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_owned()
}

fn default_version() -> String {
    DEFAULT_NOTION_VERSION.to_owned()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl std::fmt::Debug for NotionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotionConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("version", &self.version)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl NotionConfig {
    /// Creates a configuration for the public API.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let config = Self {
            api_key: api_key.into(),
            base_url: default_base_url(),
            version: default_version(),
            timeout_secs: default_timeout_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
        };
        config.validate()?;
        Ok(config)
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Sets the API version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
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
            return Err(Error::config("Notion API key is required"));
        }
        if self.version.trim().is_empty() {
            return Err(Error::config("Notion API version must not be empty"));
        }
        Ok(())
    }

    /// Like [`validate`](Self::validate), but logs the problem and returns
    /// `false` instead of failing.
    pub fn is_valid(&self) -> bool {
        match self.validate() {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(target: TRACING_TARGET, error = %e, "Invalid Notion configuration");
                false
            }
        }
    }

    pub(crate) fn http_config(&self) -> Result<HttpConfig> {
        let config = HttpConfig::new(&self.base_url)?
            .with_bearer_token(self.api_key.clone())
            .with_header("Notion-Version", self.version.clone())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries);
        Ok(config)
    }
}
