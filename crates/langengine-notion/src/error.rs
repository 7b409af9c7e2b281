//! Error types for langengine-notion.

use langengine_tool::ToolError;
use thiserror::Error;

/// Result type alias for Notion operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors produced by [`NotionClient`](crate::NotionClient).
#[derive(Debug, Error)]
pub enum Error {
    /// The Notion API request failed.
    #[error("Notion API request failed: {0}")]
    Http(#[from] langengine_http::Error),

    /// The API answered with an unexpected payload.
    #[error("invalid Notion response: {0}")]
    InvalidResponse(String),

    /// A request parameter was rejected before sending.
    #[error("invalid Notion request: {0}")]
    InvalidInput(String),

    /// Invalid configuration.
    #[error("Notion configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns a stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Http(langengine_http::Error::RateLimited { .. }) => "NOTION_RATE_LIMITED",
            Self::Http(langengine_http::Error::Config { .. }) | Self::Config(_) => {
                "NOTION_CONFIG_ERROR"
            }
            Self::Http(_) => "NOTION_API_ERROR",
            Self::InvalidResponse(_) => "NOTION_INVALID_RESPONSE",
            Self::InvalidInput(_) => "NOTION_INVALID_INPUT",
        }
    }

    /// Returns the upstream HTTP status, if known.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http(e) => e.status_code(),
            _ => None,
        }
    }

    /// Returns Notion's own error code, such as `object_not_found`.
    pub fn upstream_code(&self) -> Option<&str> {
        match self {
            Self::Http(e) => e.code(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

impl From<Error> for ToolError {
    fn from(err: Error) -> Self {
        let message = match err.upstream_code() {
            Some(upstream) => format!("{} ({})", err, upstream),
            None => err.to_string(),
        };
        ToolError::execution(Some(err.code()), message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_keep_upstream_details() {
        let err = Error::from(langengine_http::Error::api(
            404,
            "Could not find page",
            Some("object_not_found".to_owned()),
            None,
        ));
        assert_eq!(err.code(), "NOTION_API_ERROR");
        assert_eq!(err.status_code(), Some(404));

        let tool_err = ToolError::from(err);
        assert_eq!(
            tool_err.to_string(),
            "[NOTION_API_ERROR] Notion API request failed: API error (status 404): \
             Could not find page (object_not_found)"
        );
    }

    #[test]
    fn local_errors_have_codes() {
        assert_eq!(Error::invalid_input("x").code(), "NOTION_INVALID_INPUT");
        assert_eq!(
            Error::from(langengine_http::Error::rate_limited(None, None)).code(),
            "NOTION_RATE_LIMITED"
        );
    }
}
