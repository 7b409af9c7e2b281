//! Tool exposing the Notion client.

use async_trait::async_trait;
use langengine_tool::{Tool, ToolDefinition, ToolError, ToolOutput};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::client::{CreatePageRequest, ObjectKind, PageParent, QueryDatabaseRequest, SearchRequest};
use crate::types::{NotionObject, PaginatedList};
use crate::{Error, NotionClient};

/// Operations accepted by [`NotionTool`].
#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum NotionOperation {
    /// Search pages and databases by title.
    Search {
        #[serde(default)]
        query: Option<String>,
        #[serde(default, alias = "filter")]
        object_type: Option<ObjectKind>,
        #[serde(default)]
        page_size: Option<u32>,
        #[serde(default)]
        start_cursor: Option<String>,
    },
    /// Query the rows of a database.
    QueryDatabase {
        database_id: String,
        #[serde(default)]
        filter: Option<Value>,
        #[serde(default)]
        sorts: Vec<Value>,
        #[serde(default)]
        page_size: Option<u32>,
        #[serde(default)]
        start_cursor: Option<String>,
    },
    /// Retrieve a page and its properties.
    GetPage { page_id: String },
    /// Read a page's blocks as plain text.
    GetPageContent { page_id: String },
    /// Create a page under a database or another page.
    CreatePage {
        #[serde(default)]
        database_id: Option<String>,
        #[serde(default)]
        parent_page_id: Option<String>,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        title_property: Option<String>,
        #[serde(default)]
        properties: Map<String, Value>,
        #[serde(default)]
        content: Option<String>,
    },
}

/// Tool exposing a [`NotionClient`].
#[derive(Debug, Clone)]
pub struct NotionTool {
    client: NotionClient,
}

impl NotionTool {
    /// Creates a new Notion tool.
    pub fn new(client: NotionClient) -> Self {
        Self { client }
    }
}

fn object_json(object: &NotionObject) -> Value {
    json!({
        "id": object.id,
        "object": object.object,
        "title": object.title(),
        "url": object.url,
        "last_edited_time": object.last_edited_time,
        "properties": object.simple_properties(),
    })
}

fn format_search(list: &PaginatedList<NotionObject>) -> String {
    if list.results.is_empty() {
        return "No results found".to_owned();
    }

    let mut out = format!("Found {} results:", list.results.len());
    for (i, object) in list.results.iter().enumerate() {
        let title = object.title().unwrap_or_else(|| "Untitled".to_owned());
        out.push_str(&format!("\n{}. [{}] {} ({})", i + 1, object.object, title, object.id));
        if let Some(url) = &object.url {
            out.push_str(&format!(" {}", url));
        }
    }
    if let Some(cursor) = list.next_cursor.as_deref().filter(|_| list.has_more) {
        out.push_str(&format!("\nMore results available, next cursor: {}", cursor));
    }
    out
}

#[async_trait]
impl Tool for NotionTool {
    const NAME: &'static str = "notion";
    type Operation = NotionOperation;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(
            Self::NAME,
            "Search, read and create pages and databases in a Notion workspace.",
            json!({
                "type": "object",
                "properties": {
                    "operation": {
                        "type": "string",
                        "enum": ["search", "query_database", "get_page", "get_page_content", "create_page"]
                    },
                    "query": {"type": "string", "description": "Title search text"},
                    "object_type": {"type": "string", "enum": ["page", "database"]},
                    "database_id": {"type": "string"},
                    "page_id": {"type": "string"},
                    "parent_page_id": {"type": "string"},
                    "filter": {"type": "object", "description": "Notion database filter object"},
                    "sorts": {"type": "array", "items": {"type": "object"}},
                    "page_size": {"type": "integer", "minimum": 1, "maximum": 100},
                    "start_cursor": {"type": "string"},
                    "title": {"type": "string"},
                    "title_property": {"type": "string", "default": "Name"},
                    "properties": {"type": "object", "description": "Raw Notion property values"},
                    "content": {"type": "string", "description": "Plain text body"}
                },
                "required": ["operation"]
            }),
        )
    }

    async fn call(&self, operation: NotionOperation) -> Result<ToolOutput, ToolError> {
        match operation {
            NotionOperation::Search {
                query,
                object_type,
                page_size,
                start_cursor,
            } => {
                let request = SearchRequest {
                    query,
                    filter: object_type,
                    page_size,
                    start_cursor,
                };
                let list = self.client.search(&request).await?;
                Ok(ToolOutput::text(format_search(&list)))
            }
            NotionOperation::QueryDatabase {
                database_id,
                filter,
                sorts,
                page_size,
                start_cursor,
            } => {
                let request = QueryDatabaseRequest {
                    filter,
                    sorts,
                    page_size,
                    start_cursor,
                };
                let list = self.client.query_database(&database_id, &request).await?;
                let rows: Vec<Value> = list.results.iter().map(object_json).collect();
                ToolOutput::json(&json!({
                    "results": rows,
                    "has_more": list.has_more,
                    "next_cursor": list.next_cursor,
                }))
            }
            NotionOperation::GetPage { page_id } => {
                let page = self.client.get_page(&page_id).await?;
                ToolOutput::json(&object_json(&page))
            }
            NotionOperation::GetPageContent { page_id } => {
                let content = self.client.get_page_content(&page_id).await?;
                Ok(ToolOutput::text(content))
            }
            NotionOperation::CreatePage {
                database_id,
                parent_page_id,
                title,
                title_property,
                properties,
                content,
            } => {
                let parent = match (database_id, parent_page_id) {
                    (Some(id), None) => PageParent::DatabaseId(id),
                    (None, Some(id)) => PageParent::PageId(id),
                    _ => {
                        return Err(Error::invalid_input(
                            "exactly one of database_id or parent_page_id is required",
                        )
                        .into());
                    }
                };
                let page = self
                    .client
                    .create_page(CreatePageRequest {
                        parent,
                        title,
                        title_property,
                        properties,
                        content,
                    })
                    .await?;
                ToolOutput::json(&json!({"id": page.id, "url": page.url}))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use langengine_tool::{ToolCall, ToolRegistry};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::NotionConfig;

    fn registry(server: &MockServer) -> ToolRegistry {
        let config = NotionConfig::new("secret_test")
            .unwrap()
            .with_base_url(server.uri())
            .with_max_retries(0);
        let mut registry = ToolRegistry::new();
        registry.register(NotionTool::new(NotionClient::new(config).unwrap()));
        registry
    }

    async fn run(registry: &ToolRegistry, arguments: Value) -> langengine_tool::ToolResult {
        registry.execute(&ToolCall::new("notion", arguments)).await
    }

    #[tokio::test]
    async fn search_is_formatted_as_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [
                    {
                        "object": "page",
                        "id": "p1",
                        "url": "https://www.notion.so/p1",
                        "properties": {"title": {"type": "title", "title": [{"plain_text": "Plan"}]}}
                    },
                    {"object": "database", "id": "d1", "title": [{"plain_text": "Tasks"}], "properties": {}}
                ],
                "has_more": true,
                "next_cursor": "next"
            })))
            .mount(&server)
            .await;

        let result = run(&registry(&server), json!({"action": "search", "query": "plan"})).await;
        assert_eq!(
            result.output.as_text(),
            Some(
                "Found 2 results:\n\
                 1. [page] Plan (p1) https://www.notion.so/p1\n\
                 2. [database] Tasks (d1)\n\
                 More results available, next cursor: next"
            )
        );
    }

    #[tokio::test]
    async fn query_database_returns_simplified_rows() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/databases/db1/query"))
            .and(body_partial_json(json!({"filter": {"property": "Done", "checkbox": {"equals": true}}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [{
                    "object": "page",
                    "id": "r1",
                    "properties": {
                        "Name": {"type": "title", "title": [{"plain_text": "Row"}]},
                        "Done": {"type": "checkbox", "checkbox": true}
                    }
                }],
                "has_more": false
            })))
            .mount(&server)
            .await;

        let result = run(
            &registry(&server),
            json!({
                "operation": "query_database",
                "database_id": "db1",
                "filter": {"property": "Done", "checkbox": {"equals": true}}
            }),
        )
        .await;
        let value = result.output.as_json().unwrap();
        assert_eq!(value["results"][0]["title"], "Row");
        assert_eq!(value["results"][0]["properties"]["Done"], true);
        assert_eq!(value["has_more"], false);
    }

    #[tokio::test]
    async fn api_failures_become_failed_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "object": "error",
                "status": 401,
                "code": "unauthorized",
                "message": "API token is invalid."
            })))
            .mount(&server)
            .await;

        let result = run(&registry(&server), json!({"operation": "get_page", "page_id": "p1"})).await;
        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.starts_with("[NOTION_API_ERROR]"));
        assert!(error.contains("API token is invalid."));
        assert!(error.ends_with("(unauthorized)"));
    }

    #[tokio::test]
    async fn create_page_requires_one_parent() {
        let server = MockServer::start().await;
        let registry = registry(&server);

        let result = run(&registry, json!({"operation": "create_page", "title": "x"})).await;
        assert!(result.error.unwrap().starts_with("[NOTION_INVALID_INPUT]"));

        let result = run(
            &registry,
            json!({"operation": "create_page", "database_id": "a", "parent_page_id": "b", "title": "x"}),
        )
        .await;
        assert!(!result.success);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let server = MockServer::start().await;
        let result = run(&registry(&server), json!({"operation": "get_page_content"})).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("page_id"));
    }
}
