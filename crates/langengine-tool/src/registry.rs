//! Tool registry for managing available tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{TRACING_TARGET, ToolCall, ToolDefinition, ToolDyn, ToolResult};

/// Registry of available tools, keyed by name.
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<String, Arc<dyn ToolDyn>>,
}

impl ToolRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool, replacing any tool with the same name.
    pub fn register(&mut self, tool: impl ToolDyn + 'static) {
        self.register_arc(Arc::new(tool));
    }

    /// Registers a shared tool.
    pub fn register_arc(&mut self, tool: Arc<dyn ToolDyn>) {
        let name = tool.name().to_owned();
        tracing::debug!(target: TRACING_TARGET, tool = %name, "Registered tool");
        self.tools.insert(name, tool);
    }

    /// Returns a tool by name.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ToolDyn>> {
        self.tools.get(name)
    }

    /// Returns whether a tool exists.
    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Returns all tool definitions, ordered by name.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    /// Executes a tool call; unknown tools yield a failed result.
    pub async fn execute(&self, call: &ToolCall) -> ToolResult {
        let Some(tool) = self.tools.get(&call.name) else {
            tracing::warn!(target: TRACING_TARGET, tool = %call.name, "Unknown tool");
            return ToolResult::failure(call.id, format!("tool '{}' not found", call.name));
        };

        tracing::debug!(
            target: TRACING_TARGET,
            tool = %call.name,
            call_id = %call.id,
            "Executing tool call"
        );

        tool.invoke(call.id, call.arguments.clone()).await
    }

    /// Returns the number of registered tools.
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Returns whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::{Tool, ToolError, ToolOutput};

    #[derive(Deserialize)]
    #[serde(tag = "operation", rename_all = "snake_case")]
    enum PingOperation {
        Ping,
    }

    struct PingTool;

    #[async_trait]
    impl Tool for PingTool {
        const NAME: &'static str = "ping";
        type Operation = PingOperation;

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(Self::NAME, "Replies pong", json!({"type": "object"}))
        }

        async fn call(&self, operation: PingOperation) -> Result<ToolOutput, ToolError> {
            match operation {
                PingOperation::Ping => Ok(ToolOutput::text("pong")),
            }
        }
    }

    #[tokio::test]
    async fn executes_registered_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(PingTool);

        assert!(registry.has_tool("ping"));
        assert_eq!(registry.definitions()[0].name(), "ping");

        let result = registry
            .execute(&ToolCall::new("ping", json!({"operation": "ping"})))
            .await;
        assert_eq!(result.output.as_text(), Some("pong"));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_failure() {
        let registry = ToolRegistry::new();
        let call = ToolCall::new("missing", json!({}));
        let result = registry.execute(&call).await;

        assert!(!result.success);
        assert_eq!(result.call_id, call.id);
        assert_eq!(result.error.as_deref(), Some("tool 'missing' not found"));
    }
}
