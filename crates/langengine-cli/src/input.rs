//! Reading tool calls from a file or stdin.

use std::path::Path;

use anyhow::Context;
use langengine_tool::ToolCall;
use serde_json::Value;
use tokio::io::AsyncReadExt;

/// Reads the raw input from `path`, or from stdin when absent.
pub async fn read_input(path: Option<&Path>) -> anyhow::Result<String> {
    match path {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut raw = String::new();
            tokio::io::stdin()
                .read_to_string(&mut raw)
                .await
                .context("failed to read stdin")?;
            Ok(raw)
        }
    }
}

/// Parses one call object or an array of them. Blank input yields no calls.
pub fn parse_calls(raw: &str) -> anyhow::Result<Vec<ToolCall>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let value: Value = serde_json::from_str(raw).context("input is not valid JSON")?;
    let items = match value {
        Value::Array(items) => items,
        other => vec![other],
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| {
            serde_json::from_value(item).with_context(|| format!("invalid tool call at index {}", i))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn parses_single_and_batched_calls() {
        let calls = parse_calls(r#"{"tool": "vector_store", "arguments": {"operation": "stats"}}"#)
            .unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].name, "vector_store");

        let calls = parse_calls(
            r#"[
                {"name": "notion", "arguments": {"operation": "search"}},
                {"tool": "vector_store", "arguments": "{\"operation\": \"stats\"}"}
            ]"#,
        )
        .unwrap();
        assert_eq!(calls.len(), 2);
        assert_ne!(calls[0].id, calls[1].id);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(parse_calls("{").is_err());
        let err = parse_calls(r#"[{"tool": "a"}, {"arguments": {}}]"#).unwrap_err();
        assert!(err.to_string().contains("index 1"));
        assert!(parse_calls("  \n").unwrap().is_empty());
    }

    #[tokio::test]
    async fn reads_input_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"tool": "vector_store"}}"#).unwrap();

        let raw = read_input(Some(file.path())).await.unwrap();
        assert_eq!(parse_calls(&raw).unwrap().len(), 1);
    }
}
