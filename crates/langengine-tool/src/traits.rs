//! The typed `Tool` trait and its object-safe `ToolDyn` counterpart.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::{TRACING_TARGET, ToolDefinition, ToolError, ToolOutput, ToolResult};

/// A tool with a closed set of operations.
///
/// `Operation` is usually an enum internally tagged on `operation`, so
/// dispatch in [`call`](Tool::call) is an exhaustive `match`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name.
    const NAME: &'static str;

    /// The operations this tool accepts.
    type Operation: DeserializeOwned + Send;

    /// Returns the tool definition advertised to callers.
    fn definition(&self) -> ToolDefinition;

    /// Runs one operation.
    async fn call(&self, operation: Self::Operation) -> Result<ToolOutput, ToolError>;
}

/// Object-safe wrapper over [`Tool`] that never fails.
#[async_trait]
pub trait ToolDyn: Send + Sync {
    /// Tool name.
    fn name(&self) -> &str;

    /// Returns the tool definition.
    fn definition(&self) -> ToolDefinition;

    /// Parses `arguments` and runs the operation, reporting every problem
    /// as a failed result.
    async fn invoke(&self, call_id: Uuid, arguments: Value) -> ToolResult;
}

#[async_trait]
impl<T: Tool> ToolDyn for T {
    fn name(&self) -> &str {
        T::NAME
    }

    fn definition(&self) -> ToolDefinition {
        Tool::definition(self)
    }

    async fn invoke(&self, call_id: Uuid, arguments: Value) -> ToolResult {
        let operation = match normalize_arguments(arguments)
            .and_then(|args| {
                serde_json::from_value::<T::Operation>(args)
                    .map_err(|e| ToolError::invalid_arguments(e.to_string()))
            }) {
            Ok(operation) => operation,
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    tool = T::NAME,
                    %call_id,
                    error = %e,
                    "Rejected tool arguments"
                );
                return ToolResult::failure(call_id, e.to_string());
            }
        };

        match self.call(operation).await {
            Ok(output) => ToolResult::success(call_id, output),
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    tool = T::NAME,
                    %call_id,
                    error = %e,
                    "Tool call failed"
                );
                ToolResult::failure(call_id, e.to_string())
            }
        }
    }
}

/// Brings raw tool arguments into the shape operation enums expect.
///
/// A JSON-encoded string is decoded first, and an `action` discriminator is
/// renamed to `operation` when the latter is absent.
pub fn normalize_arguments(arguments: Value) -> Result<Value, ToolError> {
    let arguments = match arguments {
        Value::String(raw) => serde_json::from_str(&raw)
            .map_err(|e| ToolError::invalid_arguments(format!("arguments are not JSON: {}", e)))?,
        other => other,
    };

    match arguments {
        Value::Object(mut map) => {
            if !map.contains_key("operation") {
                if let Some(action) = map.remove("action") {
                    map.insert("operation".to_owned(), action);
                }
            }
            if !map.contains_key("operation") {
                return Err(ToolError::invalid_arguments(
                    "missing 'operation' (or 'action') field",
                ));
            }
            Ok(Value::Object(map))
        }
        Value::Null => Err(ToolError::invalid_arguments("arguments are required")),
        other => Err(ToolError::invalid_arguments(format!(
            "arguments must be a JSON object, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;

    #[derive(Debug, Deserialize)]
    #[serde(tag = "operation", rename_all = "snake_case")]
    enum EchoOperation {
        Say { text: String },
        Fail,
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        const NAME: &'static str = "echo";
        type Operation = EchoOperation;

        fn definition(&self) -> ToolDefinition {
            ToolDefinition::new(Self::NAME, "Echoes text", json!({"type": "object"}))
        }

        async fn call(&self, operation: EchoOperation) -> Result<ToolOutput, ToolError> {
            match operation {
                EchoOperation::Say { text } => Ok(ToolOutput::text(text)),
                EchoOperation::Fail => Err(ToolError::execution(Some("ECHO_ERROR"), "asked to fail")),
            }
        }
    }

    #[test]
    fn action_is_an_alias_for_operation() {
        let args = normalize_arguments(json!({"action": "fail"})).unwrap();
        assert_eq!(args, json!({"operation": "fail"}));
    }

    #[test]
    fn decodes_string_arguments() {
        let args = normalize_arguments(json!(r#"{"operation": "fail"}"#)).unwrap();
        assert_eq!(args["operation"], "fail");
    }

    #[test]
    fn rejects_non_objects() {
        assert!(normalize_arguments(json!([1, 2])).is_err());
        assert!(normalize_arguments(Value::Null).is_err());
        assert!(normalize_arguments(json!({"text": "hi"})).is_err());
    }

    #[tokio::test]
    async fn invoke_dispatches_operation() {
        let result = EchoTool
            .invoke(Uuid::now_v7(), json!({"operation": "say", "text": "hi"}))
            .await;
        assert!(result.success);
        assert_eq!(result.output.as_text(), Some("hi"));
    }

    #[tokio::test]
    async fn invoke_never_fails() {
        let id = Uuid::now_v7();

        let unknown = EchoTool.invoke(id, json!({"operation": "shout"})).await;
        assert!(!unknown.success);
        assert!(unknown.error.unwrap().contains("unknown variant"));

        let missing = EchoTool.invoke(id, json!({"operation": "say"})).await;
        assert!(!missing.success);
        assert!(missing.error.unwrap().contains("text"));

        let failed = EchoTool.invoke(id, json!({"action": "fail"})).await;
        assert_eq!(failed.error.as_deref(), Some("[ECHO_ERROR] asked to fail"));
        assert_eq!(failed.call_id, id);
    }
}
