//! Request and response types for [`HttpClient`](crate::HttpClient).

use reqwest::Method;
use reqwest::header::HeaderMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{Error, Result};

/// An HTTP request relative to the configured base URL.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Path joined onto the base URL.
    pub path: String,
    /// Query string pairs, appended in order.
    pub query: Vec<(String, String)>,
    /// Per-request headers.
    pub headers: Vec<(String, String)>,
    /// Optional JSON body.
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Creates a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Creates a `GET` request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Creates a `POST` request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    /// Creates a `PATCH` request.
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    /// Creates a `DELETE` request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Appends a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Adds a header to this request only.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}

/// A successful HTTP response with its body fully read.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Response headers.
    pub headers: HeaderMap,
    /// Raw body text.
    pub body: String,
}

impl HttpResponse {
    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            Error::invalid_response(
                format!("failed to parse response body: {}", e),
                Some(self.body.clone()),
            )
        })
    }

    /// Returns a header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns true if the body is empty or whitespace.
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[test]
    fn builds_request_with_query_and_body() {
        let request = HttpRequest::post("rest/v1/docs")
            .with_query("id", "in.(a,b)")
            .with_header("Prefer", "return=minimal")
            .with_json(&serde_json::json!({"id": "a"}))
            .unwrap();

        assert_eq!(request.method, Method::POST);
        assert_eq!(request.query, vec![("id".into(), "in.(a,b)".into())]);
        assert_eq!(request.headers.len(), 1);
        assert_eq!(request.body, Some(serde_json::json!({"id": "a"})));
    }

    #[test]
    fn parses_json_response() {
        #[derive(Deserialize)]
        struct Payload {
            count: usize,
        }

        let response = HttpResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: r#"{"count": 3}"#.into(),
        };
        assert_eq!(response.json::<Payload>().unwrap().count, 3);
    }

    #[test]
    fn invalid_json_keeps_body() {
        let response = HttpResponse {
            status: 200,
            headers: HeaderMap::new(),
            body: "not json".into(),
        };
        let err = response.json::<Value>().unwrap_err();
        assert_eq!(err.body(), Some("not json"));
    }
}
