//! Error types for langengine-dashscope.

use thiserror::Error;

/// Result type alias for DashScope operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by [`DashScopeClient`](crate::DashScopeClient).
#[derive(Debug, Error)]
pub enum Error {
    /// The embedding request failed.
    #[error("DashScope embedding request failed: {0}")]
    Http(#[from] langengine_http::Error),

    /// The service answered with an unexpected payload.
    #[error("invalid DashScope response: {0}")]
    InvalidResponse(String),

    /// Invalid configuration.
    #[error("DashScope configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns a stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(langengine_http::Error::RateLimited { .. }) => "DASHSCOPE_RATE_LIMITED",
            Self::Http(langengine_http::Error::Config { .. }) | Self::Config(_) => {
                "DASHSCOPE_CONFIG_ERROR"
            }
            Self::Http(_) => "DASHSCOPE_EMBEDDING_ERROR",
            Self::InvalidResponse(_) => "DASHSCOPE_INVALID_RESPONSE",
        }
    }

    /// Returns the upstream HTTP status, if known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status_code(),
            _ => None,
        }
    }
}

impl From<Error> for langengine_core::Error {
    fn from(err: Error) -> Self {
        let code = err.code();
        match err {
            Error::Http(e) => {
                let base: langengine_core::Error = e.into();
                let message = format!("[{}] {}", code, base.message.as_deref().unwrap_or_default());
                base.with_message(message)
            }
            Error::InvalidResponse(_) => langengine_core::Error::external_error()
                .with_message(format!("[{}] {}", code, err))
                .with_source(err),
            Error::Config(_) => langengine_core::Error::configuration()
                .with_message(format!("[{}] {}", code, err))
                .with_source(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        let err = Error::from(langengine_http::Error::api(401, "bad key", None, None));
        assert_eq!(err.code(), "DASHSCOPE_EMBEDDING_ERROR");
        assert_eq!(err.status_code(), Some(401));

        let err = Error::from(langengine_http::Error::rate_limited(None, None));
        assert_eq!(err.code(), "DASHSCOPE_RATE_LIMITED");

        assert_eq!(Error::invalid_response("x").code(), "DASHSCOPE_INVALID_RESPONSE");
    }

    #[test]
    fn converts_into_core_error() {
        let err = Error::from(langengine_http::Error::api(401, "bad key", None, None));
        let core: langengine_core::Error = err.into();
        assert_eq!(core.kind(), langengine_core::ErrorKind::Authentication);
        assert!(core.to_string().contains("DASHSCOPE_EMBEDDING_ERROR"));

        let core: langengine_core::Error = Error::config("missing key").into();
        assert_eq!(core.kind(), langengine_core::ErrorKind::Configuration);
    }
}
