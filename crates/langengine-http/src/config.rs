//! Configuration for the shared HTTP client.

use std::time::Duration;

use url::Url;

use crate::{Error, Result};

/// Default timeout for HTTP requests: 30 seconds.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default number of retries after a rate-limited response.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default base delay between retries; attempt `n` waits `n * backoff`.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Default upper bound on a server-requested `Retry-After` delay.
pub const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Configuration for [`HttpClient`](crate::HttpClient).
///
/// Built through [`HttpConfig::new`], which validates the base URL; the
/// remaining knobs are optional and set with the `with_*` methods.
#[derive(Clone)]
pub struct HttpConfig {
    base_url: Url,
    bearer_token: Option<String>,
    timeout: Duration,
    max_retries: u32,
    retry_backoff: Duration,
    max_retry_delay: Duration,
    user_agent: String,
    headers: Vec<(String, String)>,
}

impl std::fmt::Debug for HttpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpConfig")
            .field("base_url", &self.base_url.as_str())
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff", &self.retry_backoff)
            .field("max_retry_delay", &self.max_retry_delay)
            .field("user_agent", &self.user_agent)
            .field("headers", &self.headers.len())
            .finish()
    }
}

impl HttpConfig {
    /// Creates a configuration for the given base URL.
    ///
    /// The URL must be absolute and use `http` or `https`.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let raw = base_url.as_ref();
        let mut base_url = Url::parse(raw)
            .map_err(|e| Error::config(format!("invalid base URL '{}': {}", raw, e)))?;

        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "base URL '{}' must use http or https",
                raw
            )));
        }

        // Relative endpoint paths are joined onto the base, which requires a
        // trailing slash to keep the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            base_url,
            bearer_token: None,
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
            user_agent: Self::default_user_agent(),
            headers: Vec::new(),
        })
    }

    fn default_user_agent() -> String {
        format!("langengine/{}", env!("CARGO_PKG_VERSION"))
    }

    /// Sets the bearer token sent in the `Authorization` header.
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Sets the request timeout; zero falls back to [`DEFAULT_TIMEOUT`].
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries after a rate-limited response.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Sets the linear backoff step between retries.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Sets the longest `Retry-After` delay the client will wait for.
    ///
    /// A rate-limited response asking for a longer wait fails immediately.
    pub fn with_max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }

    /// Sets the User-Agent header.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Adds a header sent with every request.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Returns the base URL (always ending with `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the bearer token, if configured.
    pub fn bearer_token(&self) -> Option<&str> {
        self.bearer_token.as_deref()
    }

    /// Returns the effective timeout, using the default if zero.
    pub fn effective_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Returns the maximum number of retries.
    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Returns the linear backoff step.
    pub fn retry_backoff(&self) -> Duration {
        self.retry_backoff
    }

    /// Returns the longest `Retry-After` delay that is honoured.
    pub fn max_retry_delay(&self) -> Duration {
        self.max_retry_delay
    }

    /// Returns the effective user agent, using the default if empty.
    pub fn effective_user_agent(&self) -> String {
        if self.user_agent.is_empty() {
            Self::default_user_agent()
        } else {
            self.user_agent.clone()
        }
    }

    /// Returns the custom default headers.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Resolves an endpoint path against the base URL.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| Error::config(format!("invalid endpoint path '{}': {}", path, e)))
    }
}
