#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod input;

use std::process;

use anyhow::Context;
use tokio::io::AsyncWriteExt;

use crate::config::{Cli, create_registry};
use crate::input::{parse_calls, read_input};

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "langengine_cli::startup";
pub const TRACING_TARGET_CONFIG: &str = "langengine_cli::config";
pub const TRACING_TARGET_EXECUTE: &str = "langengine_cli::execute";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_STARTUP,
            error = %error,
            "langengine terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();

    Cli::init_tracing();
    cli.log();
    cli.validate()?;

    let registry = create_registry(&cli).await?;
    let mut stdout = tokio::io::stdout();

    if cli.list_tools {
        for definition in registry.definitions() {
            let line = serde_json::to_string(&definition)?;
            stdout.write_all(line.as_bytes()).await?;
            stdout.write_all(b"\n").await?;
        }
        stdout.flush().await?;
        return Ok(());
    }

    let raw = read_input(cli.input.as_deref()).await?;
    let calls = parse_calls(&raw)?;
    if calls.is_empty() {
        tracing::warn!(target: TRACING_TARGET_EXECUTE, "No tool calls in input");
        return Ok(());
    }

    let mut failures = 0usize;
    for call in &calls {
        let result = registry.execute(call).await;
        if !result.success {
            failures += 1;
        }

        let line = serde_json::to_string(&result).context("failed to serialize tool result")?;
        stdout.write_all(line.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
    }
    stdout.flush().await?;

    tracing::info!(
        target: TRACING_TARGET_EXECUTE,
        calls = calls.len(),
        failures,
        "Tool calls finished"
    );

    Ok(())
}
