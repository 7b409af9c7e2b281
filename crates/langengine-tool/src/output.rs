//! Tool output payloads.

use serde::{Deserialize, Serialize};

use crate::ToolError;

/// Output produced by a tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ToolOutput {
    /// No output.
    #[default]
    Empty,
    /// Human-readable text.
    Text(String),
    /// Structured JSON.
    Json(serde_json::Value),
}

impl ToolOutput {
    /// Creates an empty output.
    pub fn empty() -> Self {
        Self::Empty
    }

    /// Creates a text output.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Serializes a value into a JSON output.
    pub fn json(value: &impl Serialize) -> Result<Self, ToolError> {
        serde_json::to_value(value)
            .map(Self::Json)
            .map_err(|e| ToolError::execution(None, format!("failed to serialize output: {}", e)))
    }

    /// Returns the text, if this is a text output.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the JSON value, if this is a JSON output.
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}
