use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use finviz_sandbox::{ExecutionLimits, ModulePolicy, NamespaceBuilder, SnippetExecutor};
use finviz_sdk::{FinvizClient, FinvizModule};
use finviz_server::{serve, Gateway, GatewayConfig};

#[derive(Parser)]
#[command(name = "mcp-finviz")]
#[command(about = "MCP server executing finvizfinance code snippets in a sandbox")]
struct Args {
    /// Wall-clock budget per snippet execution, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the protocol; logs go to stderr.
    let default_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_level.to_string())),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting MCP Finviz server...");

    let client = FinvizClient::new().context("failed to build finviz client")?;
    let namespace = NamespaceBuilder::new()
        .bind(FinvizModule::new(client))
        .build();
    let executor = SnippetExecutor::new(
        namespace,
        ModulePolicy::baseline(),
        ExecutionLimits::with_max_duration(Duration::from_secs(args.timeout_secs)),
    );
    let gateway = Gateway::new(executor, GatewayConfig::default());

    serve(gateway).await?;

    info!("MCP Finviz server stopped.");
    Ok(())
}
