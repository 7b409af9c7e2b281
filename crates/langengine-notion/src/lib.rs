#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;
mod tool;

pub mod types;

pub use crate::client::{
    CreatePageRequest, MAX_BLOCK_DEPTH, MAX_PAGE_SIZE, NotionClient, ObjectKind, PageParent,
    QueryDatabaseRequest, SearchRequest,
};
pub use crate::config::{DEFAULT_BASE_URL, DEFAULT_NOTION_VERSION, NotionConfig};
pub use crate::error::{Error, Result};
pub use crate::tool::{NotionOperation, NotionTool};

/// Tracing target for Notion operations.
pub const TRACING_TARGET: &str = "langengine_notion";
