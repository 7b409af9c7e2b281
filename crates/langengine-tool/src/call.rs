//! Tool calls and their results.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ToolOutput;

/// A request to run one tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique ID for this call.
    #[serde(default = "Uuid::now_v7")]
    pub id: Uuid,

    /// Name of the tool being called.
    #[serde(alias = "tool")]
    pub name: String,

    /// Arguments to the tool (JSON).
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Creates a new tool call.
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            name: name.into(),
            arguments,
        }
    }

    /// Returns the arguments as a JSON string.
    pub fn arguments_string(&self) -> String {
        serde_json::to_string(&self.arguments).unwrap_or_default()
    }
}

/// Result of a tool execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for.
    pub call_id: Uuid,

    /// Whether the call succeeded.
    pub success: bool,

    /// Output from the tool.
    pub output: ToolOutput,

    /// Error message if failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    /// Creates a successful result.
    pub fn success(call_id: Uuid, output: ToolOutput) -> Self {
        Self {
            call_id,
            success: true,
            output,
            error: None,
        }
    }

    /// Creates a failed result.
    pub fn failure(call_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            call_id,
            success: false,
            output: ToolOutput::empty(),
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_tool_alias_without_id() {
        let call: ToolCall = serde_json::from_value(serde_json::json!({
            "tool": "vector_store",
            "arguments": {"operation": "stats"}
        }))
        .unwrap();

        assert_eq!(call.name, "vector_store");
        assert_eq!(call.arguments_string(), r#"{"operation":"stats"}"#);
    }

    #[test]
    fn tool_result_success() {
        let result = ToolResult::success(Uuid::now_v7(), ToolOutput::text("done"));
        assert!(result.success);
        assert!(result.error.is_none());
    }

    #[test]
    fn tool_result_failure() {
        let result = ToolResult::failure(Uuid::now_v7(), "something went wrong");
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("something went wrong"));
        assert_eq!(result.output, ToolOutput::Empty);
    }
}
