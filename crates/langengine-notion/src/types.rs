//! Notion object model, reduced to what the client reads.

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// Largest rich text segment Notion accepts.
pub const MAX_TEXT_CHARS: usize = 2000;

/// Most rich text segments Notion accepts in one block.
pub const MAX_RICH_TEXT_ITEMS: usize = 100;

/// Most child blocks Notion accepts in one request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

/// A page of results from a paginated endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaginatedList<T> {
    /// Objects in this page.
    pub results: Vec<T>,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_cursor: Option<String>,
    /// Whether more pages exist.
    #[serde(default)]
    pub has_more: bool,
}

/// A page or a database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotionObject {
    /// Either `page` or `database`.
    pub object: String,
    /// Object id.
    pub id: String,
    /// Public URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_edited_time: Option<Timestamp>,
    #[serde(default)]
    pub archived: bool,
    /// Parent reference.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub parent: Value,
    /// Page property values, or a database's property schema.
    #[serde(default)]
    pub properties: Map<String, Value>,
    /// Database title; pages keep theirs in `properties`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub title: Vec<Value>,
}

impl NotionObject {
    /// Returns the plain-text title, if any.
    pub fn title(&self) -> Option<String> {
        if !self.title.is_empty() {
            return Some(plain_text(&self.title)).filter(|t| !t.is_empty());
        }

        self.properties
            .values()
            .find(|p| p.get("type").and_then(Value::as_str) == Some("title"))
            .and_then(|p| p.get("title"))
            .and_then(Value::as_array)
            .map(|segments| plain_text(segments))
            .filter(|t| !t.is_empty())
    }

    /// Returns property values flattened to plain JSON scalars.
    pub fn simple_properties(&self) -> Map<String, Value> {
        self.properties
            .iter()
            .map(|(name, value)| (name.clone(), simplify_property(value)))
            .collect()
    }
}

/// A content block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    /// Block id.
    pub id: String,
    /// Block type, e.g. `paragraph` or `heading_1`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Whether the block has nested blocks.
    #[serde(default)]
    pub has_children: bool,
    /// Remaining fields, including the type-specific payload.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl Block {
    /// Renders the block as one line of plain text.
    ///
    /// Returns `None` for blocks without a textual representation.
    pub fn to_text(&self) -> Option<String> {
        let payload = self.data.get(&self.kind);
        let text = payload
            .and_then(|p| p.get("rich_text"))
            .and_then(Value::as_array)
            .map(|segments| plain_text(segments))
            .unwrap_or_default();

        let line = match self.kind.as_str() {
            "heading_1" => format!("# {}", text),
            "heading_2" => format!("## {}", text),
            "heading_3" => format!("### {}", text),
            "bulleted_list_item" => format!("- {}", text),
            "numbered_list_item" => format!("1. {}", text),
            "quote" => format!("> {}", text),
            "to_do" => {
                let checked = payload
                    .and_then(|p| p.get("checked"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                format!("[{}] {}", if checked { "x" } else { " " }, text)
            }
            "code" => {
                let language = payload
                    .and_then(|p| p.get("language"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                format!("```{}\n{}\n```", language, text)
            }
            "divider" => "---".to_owned(),
            "child_page" | "child_database" => {
                let title = payload
                    .and_then(|p| p.get("title"))
                    .and_then(Value::as_str)
                    .unwrap_or_default();
                format!("[{}] {}", self.kind.replace('_', " "), title)
            }
            _ if text.is_empty() => return None,
            _ => text,
        };
        Some(line)
    }
}

/// Concatenates the `plain_text` of rich text segments.
pub fn plain_text(segments: &[Value]) -> String {
    segments
        .iter()
        .filter_map(|s| {
            s.get("plain_text")
                .or_else(|| s.get("text").and_then(|t| t.get("content")))
                .and_then(Value::as_str)
        })
        .collect()
}

/// Builds rich text segments, splitting text longer than [`MAX_TEXT_CHARS`].
pub fn rich_text(text: &str) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(MAX_TEXT_CHARS)
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({"type": "text", "text": {"content": content}})
        })
        .collect()
}

/// Builds paragraph blocks, one per blank-line separated paragraph.
///
/// A paragraph needing more than [`MAX_RICH_TEXT_ITEMS`] segments continues
/// in further blocks.
pub fn paragraphs(content: &str) -> Vec<Value> {
    content
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .flat_map(|p| {
            rich_text(p)
                .chunks(MAX_RICH_TEXT_ITEMS)
                .map(|segments| {
                    json!({
                        "object": "block",
                        "type": "paragraph",
                        "paragraph": {"rich_text": segments}
                    })
                })
                .collect::<Vec<_>>()
        })
        .collect()
}

fn simplify_property(value: &Value) -> Value {
    let Some(kind) = value.get("type").and_then(Value::as_str) else {
        return value.clone();
    };
    let inner = value.get(kind).unwrap_or(&Value::Null);

    match kind {
        "title" | "rich_text" => inner
            .as_array()
            .map(|segments| Value::String(plain_text(segments)))
            .unwrap_or(Value::Null),
        "select" | "status" => inner.get("name").cloned().unwrap_or(Value::Null),
        "multi_select" => inner
            .as_array()
            .map(|options| {
                options
                    .iter()
                    .filter_map(|o| o.get("name").cloned())
                    .collect::<Vec<_>>()
                    .into()
            })
            .unwrap_or(Value::Null),
        "date" => inner.get("start").cloned().unwrap_or(Value::Null),
        "people" | "relation" => inner
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|i| i.get("id").cloned())
                    .collect::<Vec<_>>()
                    .into()
            })
            .unwrap_or(Value::Null),
        "formula" => inner
            .get("type")
            .and_then(Value::as_str)
            .and_then(|t| inner.get(t))
            .cloned()
            .unwrap_or(Value::Null),
        _ => inner.clone(),
    }
}
