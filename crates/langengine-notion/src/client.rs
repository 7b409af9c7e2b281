//! Notion REST client.

use futures::future::BoxFuture;
use langengine_http::{HttpClient, HttpRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};
use crate::types::{
    Block, MAX_BLOCKS_PER_REQUEST, NotionObject, PaginatedList, paragraphs, rich_text,
};
use crate::{NotionConfig, TRACING_TARGET};

/// Largest page size Notion accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Deepest level of nested blocks read by [`NotionClient::get_page_content`].
pub const MAX_BLOCK_DEPTH: usize = 3;

/// Restricts a search to pages or databases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Page,
    Database,
}

/// Parameters of `POST /v1/search`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Text matched against titles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Only return this kind of object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<ObjectKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

/// Parameters of `POST /v1/databases/{id}/query`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryDatabaseRequest {
    /// Notion filter object, passed through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Notion sort objects, passed through unchanged.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sorts: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_cursor: Option<String>,
}

/// Where a new page is created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageParent {
    /// A row in a database.
    DatabaseId(String),
    /// A sub-page.
    PageId(String),
}

/// Parameters of `POST /v1/pages`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatePageRequest {
    pub parent: PageParent,
    /// Page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Name of the title property, for database parents. Defaults to `Name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_property: Option<String>,
    /// Raw property values, merged under the title.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub properties: Map<String, Value>,
    /// Plain text body; blank lines separate paragraphs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl CreatePageRequest {
    /// Returns the page body and the content blocks that did not fit in it.
    fn into_body(self) -> Result<(Value, Vec<Value>)> {
        let (parent, title_key) = match &self.parent {
            PageParent::DatabaseId(id) => (
                json!({"database_id": checked_id(id, "database")?}),
                self.title_property.clone().unwrap_or_else(|| "Name".to_owned()),
            ),
            PageParent::PageId(id) => (json!({"page_id": checked_id(id, "page")?}), "title".to_owned()),
        };

        let mut properties = self.properties;
        if let Some(title) = self.title.as_deref() {
            properties.insert(title_key, json!({"title": rich_text(title)}));
        }
        if properties.is_empty() {
            return Err(Error::invalid_input("a page needs a title or properties"));
        }

        let mut body = json!({"parent": parent, "properties": properties});
        let mut overflow = Vec::new();
        if let Some(content) = self.content.as_deref() {
            let mut children = paragraphs(content);
            if children.len() > MAX_BLOCKS_PER_REQUEST {
                overflow = children.split_off(MAX_BLOCKS_PER_REQUEST);
            }
            if !children.is_empty() {
                body["children"] = Value::Array(children);
            }
        }
        Ok((body, overflow))
    }
}

/// Client for the Notion REST API.
#[derive(Debug, Clone)]
pub struct NotionClient {
    http: HttpClient,
}

impl NotionClient {
    /// Creates a client, validating the configuration first.
    pub fn new(config: NotionConfig) -> Result<Self> {
        config.validate()?;
        let http = HttpClient::new(config.http_config()?)?;

        tracing::debug!(
            target: TRACING_TARGET,
            base_url = %config.base_url,
            version = %config.version,
            "Notion client initialized"
        );

        Ok(Self { http })
    }

    /// Searches pages and databases shared with the integration.
    pub async fn search(&self, request: &SearchRequest) -> Result<PaginatedList<NotionObject>> {
        let mut body = json!({});
        if let Some(query) = request.query.as_deref().filter(|q| !q.trim().is_empty()) {
            body["query"] = json!(query);
        }
        if let Some(kind) = request.filter {
            body["filter"] = json!({"property": "object", "value": kind});
        }
        if let Some(size) = request.page_size {
            body["page_size"] = json!(page_size(size)?);
        }
        if let Some(cursor) = &request.start_cursor {
            body["start_cursor"] = json!(cursor);
        }

        tracing::debug!(target: TRACING_TARGET, query = ?request.query, "Searching Notion");
        Ok(self.http.post_json("v1/search", &body).await?)
    }

    /// Queries the rows of a database.
    pub async fn query_database(
        &self,
        database_id: &str,
        request: &QueryDatabaseRequest,
    ) -> Result<PaginatedList<NotionObject>> {
        let id = checked_id(database_id, "database")?;
        if let Some(size) = request.page_size {
            page_size(size)?;
        }

        tracing::debug!(target: TRACING_TARGET, database_id = %id, "Querying database");
        Ok(self
            .http
            .post_json(format!("v1/databases/{}/query", id), request)
            .await?)
    }

    /// Retrieves a page and its properties.
    pub async fn get_page(&self, page_id: &str) -> Result<NotionObject> {
        let id = checked_id(page_id, "page")?;
        tracing::debug!(target: TRACING_TARGET, page_id = %id, "Retrieving page");
        Ok(self.http.get_json(format!("v1/pages/{}", id)).await?)
    }

    /// Retrieves one page of a block's children.
    pub async fn get_block_children(
        &self,
        block_id: &str,
        start_cursor: Option<&str>,
    ) -> Result<PaginatedList<Block>> {
        let id = checked_id(block_id, "block")?;
        let mut request = HttpRequest::get(format!("v1/blocks/{}/children", id))
            .with_query("page_size", MAX_PAGE_SIZE.to_string());
        if let Some(cursor) = start_cursor {
            request = request.with_query("start_cursor", cursor);
        }
        Ok(self.http.send(request).await?.json()?)
    }

    /// Reads every block of a page, following pagination and nesting, and
    /// renders it as plain text. Nested blocks are indented.
    pub async fn get_page_content(&self, page_id: &str) -> Result<String> {
        let mut lines = Vec::new();
        self.collect_text(page_id.to_owned(), 0, &mut lines).await?;
        tracing::debug!(target: TRACING_TARGET, page_id, lines = lines.len(), "Read page content");
        Ok(lines.join("\n"))
    }

    fn collect_text<'a>(
        &'a self,
        block_id: String,
        depth: usize,
        lines: &'a mut Vec<String>,
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            let mut cursor: Option<String> = None;
            loop {
                let page = self.get_block_children(&block_id, cursor.as_deref()).await?;
                for block in page.results {
                    if let Some(text) = block.to_text() {
                        let indent = "  ".repeat(depth);
                        lines.extend(text.lines().map(|line| format!("{}{}", indent, line)));
                    }
                    // Child pages are separate documents.
                    if block.has_children && block.kind != "child_page" && depth + 1 < MAX_BLOCK_DEPTH {
                        self.collect_text(block.id, depth + 1, lines).await?;
                    }
                }

                match page.next_cursor.filter(|_| page.has_more) {
                    Some(next) => cursor = Some(next),
                    None => return Ok(()),
                }
            }
        })
    }

    /// Creates a page and returns it.
    ///
    /// Content beyond the first [`MAX_BLOCKS_PER_REQUEST`] blocks is appended
    /// to the new page in further requests.
    pub async fn create_page(&self, request: CreatePageRequest) -> Result<NotionObject> {
        let (body, overflow) = request.into_body()?;
        tracing::debug!(
            target: TRACING_TARGET,
            parent = %body["parent"],
            appended_blocks = overflow.len(),
            "Creating page"
        );

        let page: NotionObject = self.http.post_json("v1/pages", &body).await?;
        for chunk in overflow.chunks(MAX_BLOCKS_PER_REQUEST) {
            self.append_block_children(&page.id, chunk).await?;
        }
        Ok(page)
    }

    /// Appends up to [`MAX_BLOCKS_PER_REQUEST`] blocks under a block or page.
    pub async fn append_block_children(&self, block_id: &str, children: &[Value]) -> Result<()> {
        let id = checked_id(block_id, "block")?;
        if children.len() > MAX_BLOCKS_PER_REQUEST {
            return Err(Error::invalid_input(format!(
                "at most {} blocks can be appended at once",
                MAX_BLOCKS_PER_REQUEST
            )));
        }

        let request = HttpRequest::patch(format!("v1/blocks/{}/children", id))
            .with_json(&json!({"children": children}))?;
        self.http.send(request).await?;
        Ok(())
    }
}

/// Rejects ids that are empty or would escape the endpoint path.
fn checked_id<'a>(id: &'a str, what: &str) -> Result<&'a str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(Error::invalid_input(format!("{} id is required", what)));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        return Err(Error::invalid_input(format!("invalid {} id '{}'", what, id)));
    }
    Ok(id)
}

fn page_size(size: u32) -> Result<u32> {
    if size == 0 || size > MAX_PAGE_SIZE {
        return Err(Error::invalid_input(format!(
            "page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(size)
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(server: &MockServer) -> NotionClient {
        let config = NotionConfig::new("secret_test")
            .unwrap()
            .with_base_url(server.uri())
            .with_max_retries(0);
        NotionClient::new(config).unwrap()
    }

    fn paragraph(id: &str, text: &str, has_children: bool) -> Value {
        json!({
            "object": "block",
            "id": id,
            "type": "paragraph",
            "has_children": has_children,
            "paragraph": {"rich_text": [{"plain_text": text}]}
        })
    }

    #[tokio::test]
    async fn search_sends_headers_and_filter() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/search"))
            .and(header("authorization", "Bearer secret_test"))
            .and(header("notion-version", "2022-06-28"))
            .and(body_json(json!({
                "query": "roadmap",
                "filter": {"property": "object", "value": "page"},
                "page_size": 5
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "results": [{
                    "object": "page",
                    "id": "p1",
                    "url": "https://www.notion.so/p1",
                    "properties": {"title": {"type": "title", "title": [{"plain_text": "Roadmap"}]}}
                }],
                "next_cursor": null,
                "has_more": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let request = SearchRequest {
            query: Some("roadmap".to_owned()),
            filter: Some(ObjectKind::Page),
            page_size: Some(5),
            start_cursor: None,
        };
        let list = client(&server).search(&request).await.unwrap();
        assert_eq!(list.results.len(), 1);
        assert_eq!(list.results[0].title().as_deref(), Some("Roadmap"));
    }

    #[tokio::test]
    async fn page_content_follows_cursors_and_nesting() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/blocks/p1/children"))
            .and(query_param("start_cursor", "c2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [paragraph("b3", "third", false)],
                "next_cursor": null,
                "has_more": false
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/blocks/p1/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [paragraph("b1", "first", true)],
                "next_cursor": "c2",
                "has_more": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/blocks/b1/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "results": [paragraph("b2", "nested", false)],
                "has_more": false
            })))
            .mount(&server)
            .await;

        let text = client(&server).get_page_content("p1").await.unwrap();
        assert_eq!(text, "first\n  nested\nthird");
    }

    #[tokio::test]
    async fn create_page_builds_database_row() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .and(body_json(json!({
                "parent": {"database_id": "db1"},
                "properties": {
                    "Name": {"title": [{"type": "text", "text": {"content": "Standup"}}]}
                },
                "children": [{
                    "object": "block",
                    "type": "paragraph",
                    "paragraph": {"rich_text": [{"type": "text", "text": {"content": "All good"}}]}
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "page",
                "id": "new-page",
                "url": "https://www.notion.so/new-page"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .create_page(CreatePageRequest {
                parent: PageParent::DatabaseId("db1".to_owned()),
                title: Some("Standup".to_owned()),
                title_property: None,
                properties: Map::new(),
                content: Some("All good".to_owned()),
            })
            .await
            .unwrap();
        assert_eq!(page.id, "new-page");
    }

    #[tokio::test]
    async fn create_page_appends_blocks_past_the_request_limit() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/pages"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "page",
                "id": "long-page",
                "url": "https://www.notion.so/long-page"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/v1/blocks/long-page/children"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "results": []
            })))
            .expect(1)
            .mount(&server)
            .await;

        let content = (0..150)
            .map(|i| format!("paragraph {}", i))
            .collect::<Vec<_>>()
            .join("\n\n");
        let page = client(&server)
            .create_page(CreatePageRequest {
                parent: PageParent::PageId("parent".to_owned()),
                title: Some("Long".to_owned()),
                title_property: None,
                properties: Map::new(),
                content: Some(content),
            })
            .await
            .unwrap();
        assert_eq!(page.id, "long-page");

        let requests = server.received_requests().await.unwrap();
        let created: Value = serde_json::from_slice(&requests[0].body).unwrap();
        assert_eq!(created["children"].as_array().unwrap().len(), 100);
        let appended: Value = serde_json::from_slice(&requests[1].body).unwrap();
        let appended = appended["children"].as_array().unwrap();
        assert_eq!(appended.len(), 50);
        assert_eq!(
            appended[49]["paragraph"]["rich_text"][0]["text"]["content"],
            "paragraph 149"
        );
    }

    #[tokio::test]
    async fn validates_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client(&server);
        let err = client.get_page("  ").await.unwrap_err();
        assert_eq!(err.code(), "NOTION_INVALID_INPUT");
        assert!(client.get_page("../users").await.is_err());

        let request = QueryDatabaseRequest {
            page_size: Some(500),
            ..Default::default()
        };
        assert!(client.query_database("db1", &request).await.is_err());
    }

    #[tokio::test]
    async fn not_found_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/pages/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "object": "error",
                "status": 404,
                "code": "object_not_found",
                "message": "Could not find page with ID: missing."
            })))
            .mount(&server)
            .await;

        let err = client(&server).get_page("missing").await.unwrap_err();
        assert_eq!(err.code(), "NOTION_API_ERROR");
        assert_eq!(err.status_code(), Some(404));
        assert_eq!(err.upstream_code(), Some("object_not_found"));
    }
}
