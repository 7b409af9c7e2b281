#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod document;
mod error;
mod health;

pub mod emb;

pub use document::{Document, Metadata};
pub use error::{BoxedError, Error, ErrorKind, Result};
pub use health::{ServiceHealth, ServiceStatus};

/// Tracing target for core operations.
pub const TRACING_TARGET: &str = "langengine_core";
