//! Shared HTTP client with rate-limit aware retries.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error, info, warn};

use crate::error::extract_api_message;
use crate::{Error, HttpConfig, HttpRequest, HttpResponse, Result, TRACING_TARGET};

/// HTTP client used by every remote integration.
///
/// Cheap to clone: clones share the underlying connection pool. Requests that
/// fail with `429 Too Many Requests` or a transport timeout are retried with
/// linear backoff, honouring `Retry-After` when the server sends it. A
/// `Retry-After` longer than [`HttpConfig::max_retry_delay`] is not waited
/// for; the rate-limit error is returned instead.
///
/// # Examples
///
/// ```ignore
/// use langengine_http::{HttpClient, HttpConfig, HttpRequest};
///
/// let config = HttpConfig::new("https://api.notion.com")?.with_bearer_token("secret");
/// let client = HttpClient::new(config)?;
/// let response = client.send(HttpRequest::get("v1/users/me")).await?;
/// ```
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<HttpClientInner>,
}

struct HttpClientInner {
    http: Client,
    config: HttpConfig,
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl HttpClient {
    /// Creates a client from the given configuration.
    pub fn new(config: HttpConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        for (key, value) in config.headers() {
            let name = HeaderName::from_bytes(key.as_bytes())
                .map_err(|e| Error::config(format!("invalid header name '{}': {}", key, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::config(format!("invalid header value for '{}': {}", key, e)))?;
            headers.insert(name, value);
        }

        if let Some(token) = config.bearer_token() {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| Error::config(format!("invalid bearer token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = Client::builder()
            .timeout(config.effective_timeout())
            .user_agent(config.effective_user_agent())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::config(format!("failed to build HTTP client: {}", e)))?;

        debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url(),
            timeout = ?config.effective_timeout(),
            max_retries = config.max_retries(),
            "HTTP client initialized"
        );

        Ok(Self {
            inner: Arc::new(HttpClientInner { http, config }),
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &HttpConfig {
        &self.inner.config
    }

    /// Sends a request, retrying rate-limited and timed out attempts.
    pub async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut attempt = 0;
        let max_retries = self.inner.config.max_retries();

        loop {
            match self.send_once(&request).await {
                Ok(response) => {
                    if attempt > 0 {
                        info!(
                            target: TRACING_TARGET,
                            attempt = attempt + 1,
                            path = %request.path,
                            "Request succeeded after retry"
                        );
                    }
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < max_retries => {
                    let max_delay = self.inner.config.max_retry_delay();
                    if e.retry_after().is_some_and(|delay| delay > max_delay) {
                        warn!(
                            target: TRACING_TARGET,
                            retry_after_secs = e.retry_after().map(|d| d.as_secs()),
                            max_delay_secs = max_delay.as_secs(),
                            path = %request.path,
                            "Retry-After exceeds the retry delay limit, giving up"
                        );
                        return Err(e);
                    }

                    attempt += 1;
                    let backoff = self.inner.config.retry_backoff() * attempt;
                    let delay = e.retry_after().unwrap_or(backoff);

                    warn!(
                        target: TRACING_TARGET,
                        attempt = attempt,
                        max_retries = max_retries,
                        delay_ms = delay.as_millis() as u64,
                        path = %request.path,
                        error = %e,
                        "Request failed, retrying"
                    );

                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    error!(
                        target: TRACING_TARGET,
                        attempt = attempt + 1,
                        path = %request.path,
                        error = %e,
                        "Request failed"
                    );
                    return Err(e);
                }
            }
        }
    }

    async fn send_once(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let url = self.inner.config.endpoint(&request.path)?;

        debug!(
            target: TRACING_TARGET,
            method = %request.method,
            url = %url,
            "Sending request"
        );

        let mut builder = self.inner.http.request(request.method.clone(), url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<HttpResponse> {
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(HttpResponse {
                status: status.as_u16(),
                headers,
                body,
            });
        }

        let body = (!body.is_empty()).then_some(body);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = headers
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(Error::rate_limited(retry_after, body));
        }

        let (message, code) = body
            .as_deref()
            .map(extract_api_message)
            .unwrap_or((None, None));
        let message = message.unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned()
        });

        Err(Error::api(status.as_u16(), message, code, body))
    }

    /// Sends a `GET` request and parses the JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: impl Into<String>) -> Result<T> {
        self.send(HttpRequest::get(path)).await?.json()
    }

    /// Sends a `POST` request with a JSON body and parses the JSON response.
    pub async fn post_json<B, T>(&self, path: impl Into<String>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = HttpRequest::post(path).with_json(body)?;
        self.send(request).await?.json()
    }

    /// Sends a `DELETE` request, discarding the response body.
    pub async fn delete(&self, path: impl Into<String>) -> Result<()> {
        self.send(HttpRequest::delete(path)).await?;
        Ok(())
    }
}
