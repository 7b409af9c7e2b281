//! Error types for langengine-http.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for HTTP client operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Maximum number of response body characters kept on errors.
const MAX_BODY_CHARS: usize = 1024;

/// Errors produced by [`HttpClient`](crate::HttpClient).
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (connection, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream API answered with a non-success status.
    #[error("API error (status {status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Error message extracted from the response
        message: String,
        /// Upstream error code, if any
        code: Option<String>,
        /// Raw response body, truncated
        body: Option<String>,
    },

    /// The upstream API answered `429 Too Many Requests`.
    #[error("rate limit exceeded")]
    RateLimited {
        /// Delay requested by the server
        retry_after: Option<Duration>,
        /// Raw response body, truncated
        body: Option<String>,
    },

    /// The response could not be interpreted.
    #[error("invalid response: {message}")]
    InvalidResponse {
        /// Description of what's invalid
        message: String,
        /// Raw response body, truncated
        body: Option<String>,
    },

    /// Request or response (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid client configuration.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem
        message: String,
    },
}

impl Error {
    /// Creates an API error.
    pub fn api(
        status: u16,
        message: impl Into<String>,
        code: Option<String>,
        body: Option<String>,
    ) -> Self {
        Self::Api {
            status,
            message: message.into(),
            code,
            body: body.map(truncate_body),
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limited(retry_after: Option<Duration>, body: Option<String>) -> Self {
        Self::RateLimited {
            retry_after,
            body: body.map(truncate_body),
        }
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>, body: Option<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            body: body.map(truncate_body),
        }
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the request should be retried.
    ///
    /// Only rate limiting and transport timeouts qualify; every other
    /// failure is surfaced immediately.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } => true,
            Self::Http(err) => err.is_timeout(),
            Self::Api { .. }
            | Self::InvalidResponse { .. }
            | Self::Serialization(_)
            | Self::Config { .. } => false,
        }
    }

    /// Returns the HTTP status code, if known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited { .. } => Some(429),
            Self::Http(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns the upstream error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    /// Returns the captured response body, if any.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Api { body, .. }
            | Self::RateLimited { body, .. }
            | Self::InvalidResponse { body, .. } => body.as_deref(),
            _ => None,
        }
    }

    /// Returns the delay requested by the server, if any.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

impl From<Error> for langengine_core::Error {
    fn from(err: Error) -> Self {
        let base = match &err {
            Error::Http(e) if e.is_timeout() => langengine_core::Error::timeout(),
            Error::Http(_) => langengine_core::Error::network_error(),
            Error::Api { status: 401 | 403, .. } => langengine_core::Error::authentication(),
            Error::Api { status: 404, .. } => langengine_core::Error::not_found(),
            Error::Api { status: 500..=599, .. } => langengine_core::Error::service_unavailable(),
            Error::Api { .. } | Error::InvalidResponse { .. } => {
                langengine_core::Error::external_error()
            }
            Error::RateLimited { .. } => langengine_core::Error::rate_limited(),
            Error::Serialization(_) => langengine_core::Error::serialization(),
            Error::Config { .. } => langengine_core::Error::configuration(),
        };
        base.with_message(err.to_string()).with_source(err)
    }
}

fn truncate_body(body: String) -> String {
    if body.chars().count() <= MAX_BODY_CHARS {
        body
    } else {
        body.chars().take(MAX_BODY_CHARS).collect()
    }
}

/// Extracts a human-readable message and an error code from an error body.
///
/// Understands the common shapes `{"message", "code"}`,
/// `{"error": {"message", "code"}}`, `{"error": "..."}` and `{"msg"}`.
pub(crate) fn extract_api_message(body: &str) -> (Option<String>, Option<String>) {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return (None, None);
    };

    let nested = value.get("error").filter(|e| e.is_object());
    let source = nested.unwrap_or(&value);

    let message = ["message", "msg", "error_description", "detail"]
        .iter()
        .find_map(|key| source.get(*key).and_then(|v| v.as_str()))
        .or_else(|| value.get("error").and_then(|v| v.as_str()))
        .map(str::to_owned);

    let code = source.get("code").and_then(|code| match code {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    (message, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_flat_message_and_code() {
        let (message, code) =
            extract_api_message(r#"{"object":"error","code":"object_not_found","message":"nope"}"#);
        assert_eq!(message.as_deref(), Some("nope"));
        assert_eq!(code.as_deref(), Some("object_not_found"));
    }

    #[test]
    fn extracts_nested_error_object() {
        let (message, code) =
            extract_api_message(r#"{"error":{"message":"bad key","code":"InvalidApiKey"}}"#);
        assert_eq!(message.as_deref(), Some("bad key"));
        assert_eq!(code.as_deref(), Some("InvalidApiKey"));
    }

    #[test]
    fn extracts_string_error_and_numeric_code() {
        let (message, code) = extract_api_message(r#"{"error":"denied","code":42}"#);
        assert_eq!(message.as_deref(), Some("denied"));
        assert_eq!(code.as_deref(), Some("42"));
    }

    #[test]
    fn non_json_body_yields_nothing() {
        assert_eq!(extract_api_message("<html>"), (None, None));
    }

    #[test]
    fn only_rate_limits_are_retryable() {
        assert!(Error::rate_limited(None, None).is_retryable());
        assert!(!Error::api(500, "boom", None, None).is_retryable());
        assert!(!Error::config("bad").is_retryable());
    }

    #[test]
    fn converts_into_core_error() {
        let err: langengine_core::Error = Error::api(401, "unauthorized", None, None).into();
        assert_eq!(err.kind(), langengine_core::ErrorKind::Authentication);

        let err: langengine_core::Error = Error::rate_limited(None, None).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn truncates_long_bodies() {
        let err = Error::api(400, "bad", None, Some("x".repeat(5000)));
        assert_eq!(err.body().map(str::len), Some(MAX_BODY_CHARS));
    }
}
