#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod client;
mod config;
mod error;

pub use crate::client::DashScopeClient;
pub use crate::config::{DEFAULT_BASE_URL, DEFAULT_MAX_BATCH_SIZE, DEFAULT_MODEL, DashScopeConfig};
pub use crate::error::{Error, Result};

/// Tracing target for DashScope operations.
pub const TRACING_TARGET: &str = "langengine_dashscope";
