//! Builds stores and tools from CLI configuration.

use std::sync::Arc;

use anyhow::Context;
use langengine_core::emb::EmbeddingService;
use langengine_dashscope::DashScopeClient;
use langengine_notion::{NotionClient, NotionTool};
use langengine_tool::{ToolRegistry, VectorStoreTool};
use langengine_vector::{BackendConfig, VectorStore};

use super::{BackendKind, Cli, StoreConfig};
use crate::TRACING_TARGET_CONFIG;

/// Creates the DashScope embedding service, if a key was supplied.
fn create_embedder(cli: &Cli) -> anyhow::Result<Option<EmbeddingService>> {
    if !cli.embedder_enabled() {
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            "No DashScope key; documents and queries must carry vectors"
        );
        return Ok(None);
    }

    let dimension = cli.store.vector.dimension();
    if let Some(requested) = cli.dashscope.dimensions
        && requested as usize != dimension
    {
        tracing::warn!(
            target: TRACING_TARGET_CONFIG,
            requested,
            dimension,
            "Embedding dimension differs from the store dimension"
        );
    }

    let client =
        DashScopeClient::new(cli.dashscope.clone()).context("failed to create DashScope client")?;
    Ok(Some(EmbeddingService::new(client)))
}

/// Creates the vector store, loading a persisted index when asked to.
async fn create_vector_store(
    config: &StoreConfig,
    embedder: Option<EmbeddingService>,
) -> anyhow::Result<VectorStore> {
    let backend = match config.backend {
        BackendKind::Memory => BackendConfig::Memory,
        BackendKind::Offline => BackendConfig::Offline(config.offline.clone()),
        BackendKind::Supabase => BackendConfig::Supabase(config.supabase.clone()),
    };

    let mut store =
        VectorStore::new(config.vector.clone(), backend).context("failed to create vector store")?;
    if let Some(embedder) = embedder {
        store = store.with_embedder(embedder);
    }

    if config.load_index && config.backend == BackendKind::Offline {
        store.load_index().await.context("failed to load vector index")?;
        tracing::info!(
            target: TRACING_TARGET_CONFIG,
            count = store.count().await?,
            "Vector index loaded"
        );
    }

    Ok(store)
}

/// Creates the tool registry: the vector store tool, plus the Notion tool
/// when a key was supplied.
pub async fn create_registry(cli: &Cli) -> anyhow::Result<ToolRegistry> {
    let embedder = create_embedder(cli)?;
    let store = create_vector_store(&cli.store, embedder).await?;

    let mut registry = ToolRegistry::new();
    registry.register(VectorStoreTool::new(Arc::new(store)));

    if cli.notion_enabled() {
        let client =
            NotionClient::new(cli.notion.clone()).context("failed to create Notion client")?;
        registry.register(NotionTool::new(client));
    }

    tracing::info!(
        target: TRACING_TARGET_CONFIG,
        tools = ?registry.definitions().iter().map(|d| d.name.clone()).collect::<Vec<_>>(),
        "Tools registered"
    );

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    fn cli(notion_key: &str, args: &[&str]) -> Cli {
        let base = [
            "langengine",
            "--dashscope-api-key",
            "",
            "--notion-api-key",
            notion_key,
            "--vector-dimension",
            "3",
        ];
        Cli::try_parse_from(base.iter().chain(args)).unwrap()
    }

    #[tokio::test]
    async fn registers_vector_store_only_by_default() {
        let registry = create_registry(&cli("", &[])).await.unwrap();
        assert!(registry.has_tool("vector_store"));
        assert!(!registry.has_tool("notion"));
    }

    #[tokio::test]
    async fn registers_notion_with_key() {
        let registry = create_registry(&cli("secret_x", &[]))
            .await
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.has_tool("notion"));
    }

    #[tokio::test]
    async fn load_index_fails_without_persisted_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let cli = cli(
            "",
            &[
                "--vector-backend",
                "offline",
                "--vector-index-path",
                path.to_str().unwrap(),
                "--load-index",
            ],
        );
        assert!(create_registry(&cli).await.is_err());
    }
}
