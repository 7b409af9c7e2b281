//! Tool error types.

use thiserror::Error;

/// Errors raised while running a tool.
///
/// They never escape [`ToolDyn::invoke`](crate::ToolDyn::invoke); they are
/// rendered into the failure message of a [`ToolResult`](crate::ToolResult).
#[derive(Debug, Error)]
pub enum ToolError {
    /// The arguments could not be parsed into an operation.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// The operation ran and failed.
    #[error("{}{message}", .code.as_ref().map(|c| format!("[{}] ", c)).unwrap_or_default())]
    Execution {
        /// Stable machine-readable error code, if any.
        code: Option<String>,
        /// Error message.
        message: String,
    },
}

impl ToolError {
    /// Creates an invalid arguments error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Creates an execution error.
    pub fn execution(code: Option<&str>, message: impl Into<String>) -> Self {
        Self::Execution {
            code: code.map(str::to_owned),
            message: message.into(),
        }
    }

    /// Returns the error code, if any.
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::InvalidArguments(_) => Some("INVALID_ARGUMENTS"),
            Self::Execution { code, .. } => code.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_display_includes_code() {
        let err = ToolError::execution(Some("NOTION_API_ERROR"), "page not found");
        assert_eq!(err.to_string(), "[NOTION_API_ERROR] page not found");

        let err = ToolError::execution(None, "boom");
        assert_eq!(err.to_string(), "boom");
    }
}
