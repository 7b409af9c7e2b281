//! Build-then-search vector engine with file persistence.

mod backend;
mod config;

pub use backend::OfflineBackend;
pub use config::OfflineConfig;
