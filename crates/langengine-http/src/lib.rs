#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;
mod request;

pub use crate::client::HttpClient;
pub use crate::config::{
    DEFAULT_MAX_RETRIES, DEFAULT_MAX_RETRY_DELAY, DEFAULT_RETRY_BACKOFF, DEFAULT_TIMEOUT, HttpConfig,
};
pub use crate::error::{Error, Result};
pub use crate::request::{HttpRequest, HttpResponse};
pub use reqwest::Method;

/// Tracing target for HTTP client operations.
pub const TRACING_TARGET: &str = "langengine_http::client";
