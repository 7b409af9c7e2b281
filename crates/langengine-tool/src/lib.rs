#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod call;
mod definition;
mod error;
mod output;
mod registry;
mod traits;

pub mod vector;

pub use call::{ToolCall, ToolResult};
pub use definition::ToolDefinition;
pub use error::ToolError;
pub use output::ToolOutput;
pub use registry::ToolRegistry;
pub use traits::{Tool, ToolDyn, normalize_arguments};
pub use vector::{VectorStoreOperation, VectorStoreTool};

/// Tracing target for tool dispatch.
pub const TRACING_TARGET: &str = "langengine_tool";
