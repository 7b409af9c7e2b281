//! CLI configuration management.
//!
//! ```text
//! Cli
//! ├── store: StoreConfig          # Backend selection, dimension, metric, index path, Supabase
//! ├── dashscope: DashScopeConfig  # Optional embedder (enabled by DASHSCOPE_API_KEY)
//! ├── notion: NotionConfig        # Optional Notion tool (enabled by NOTION_API_KEY)
//! └── input / list_tools          # What to run
//! ```
//!
//! All configuration can be provided via CLI arguments or environment variables.
//! Use `--help` to see all available options.

mod provider;

use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Args, Parser, ValueEnum};
use langengine_dashscope::DashScopeConfig;
use langengine_notion::NotionConfig;
use langengine_vector::{OfflineConfig, SupabaseConfig, VectorStoreConfig};
pub use provider::create_registry;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::{TRACING_TARGET_CONFIG, TRACING_TARGET_STARTUP};

/// Vector engine selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendKind {
    /// Incremental in-memory engine.
    #[default]
    Memory,
    /// Explicitly built engine with file persistence.
    Offline,
    /// Supabase / PostgREST.
    Supabase,
}

/// Vector store configuration.
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// Vector engine.
    #[arg(long = "vector-backend", env = "VECTOR_BACKEND", value_enum, default_value_t)]
    pub backend: BackendKind,

    #[command(flatten)]
    pub vector: VectorStoreConfig,

    #[command(flatten)]
    pub offline: OfflineConfig,

    #[command(flatten)]
    pub supabase: SupabaseConfig,

    /// Load the persisted index before running calls (offline engine).
    #[arg(long = "load-index", env = "VECTOR_LOAD_INDEX")]
    pub load_index: bool,
}

/// Complete CLI configuration.
#[derive(Debug, Clone, Parser)]
#[command(name = "langengine")]
#[command(about = "Runs langengine tool calls against a configured vector store")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub store: StoreConfig,

    /// DashScope embeddings, used for text documents and queries.
    #[command(flatten)]
    pub dashscope: DashScopeConfig,

    /// Notion tool configuration.
    #[command(flatten)]
    pub notion: NotionConfig,

    /// File with one tool call or an array of calls; stdin when omitted.
    #[arg(long, short = 'i', env = "LANGENGINE_INPUT")]
    pub input: Option<PathBuf>,

    /// Print the registered tool definitions and exit.
    #[arg(long)]
    pub list_tools: bool,
}

impl Cli {
    /// Loads environment variables from .env file (if enabled) and parses CLI arguments.
    pub fn init() -> Self {
        Self::load_dotenv();
        Self::parse()
    }

    #[cfg(feature = "dotenv")]
    fn load_dotenv() {
        if let Err(err) = dotenvy::dotenv()
            && !err.not_found()
        {
            eprintln!("Warning: failed to load .env file: {err}");
        }
    }

    #[cfg(not(feature = "dotenv"))]
    fn load_dotenv() {}

    /// Initializes tracing with environment-based filtering. Logs go to
    /// stderr; stdout carries tool results.
    pub fn init_tracing() {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    /// Returns true when a DashScope key was supplied.
    pub fn embedder_enabled(&self) -> bool {
        !self.dashscope.api_key.trim().is_empty()
    }

    /// Returns true when a Notion key was supplied.
    pub fn notion_enabled(&self) -> bool {
        !self.notion.api_key.trim().is_empty()
    }

    /// Validates all configuration values.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.store
            .vector
            .validate()
            .context("invalid vector store configuration")?;
        if self.store.backend == BackendKind::Supabase {
            self.store
                .supabase
                .validate()
                .context("invalid Supabase configuration")?;
        }
        if self.store.load_index && self.store.backend != BackendKind::Offline {
            tracing::warn!(
                target: TRACING_TARGET_CONFIG,
                backend = ?self.store.backend,
                "--load-index only affects the offline backend"
            );
        }
        if self.embedder_enabled() && !self.dashscope.is_valid() {
            anyhow::bail!("invalid DashScope configuration");
        }
        if self.notion_enabled() && !self.notion.is_valid() {
            anyhow::bail!("invalid Notion configuration");
        }
        Ok(())
    }

    /// Logs configuration (no sensitive information).
    pub fn log(&self) {
        tracing::debug!(
            target: TRACING_TARGET_STARTUP,
            version = env!("CARGO_PKG_VERSION"),
            pid = process::id(),
            arch = std::env::consts::ARCH,
            os = std::env::consts::OS,
            features = ?Self::enabled_features(),
            "Build information"
        );

        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            backend = ?self.store.backend,
            dimension = self.store.vector.dimension(),
            metric = %self.store.vector.metric(),
            index_path = ?self.store.offline.index_path(),
            embedder = self.embedder_enabled(),
            embedding_model = %self.dashscope.model,
            notion = self.notion_enabled(),
            "Configuration"
        );
    }

    fn enabled_features() -> Vec<&'static str> {
        [cfg!(feature = "dotenv").then_some("dotenv")]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_store_flags() {
        let cli = Cli::try_parse_from([
            "langengine",
            "--vector-backend",
            "offline",
            "--vector-dimension",
            "3",
            "--vector-metric",
            "L2",
            "--vector-index-path",
            "/tmp/index.json",
            "--load-index",
        ])
        .unwrap();

        assert_eq!(cli.store.backend, BackendKind::Offline);
        assert_eq!(cli.store.vector.dimension(), 3);
        assert_eq!(
            cli.store.vector.metric(),
            langengine_vector::DistanceMetric::Euclidean
        );
        assert!(cli.store.load_index);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn supabase_backend_requires_connection() {
        let cli = Cli::try_parse_from([
            "langengine",
            "--vector-backend",
            "supabase",
            "--supabase-url",
            "",
            "--supabase-api-key",
            "",
        ])
        .unwrap();
        assert!(cli.validate().is_err());
    }
}
