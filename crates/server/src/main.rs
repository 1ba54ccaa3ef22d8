//! webrace MCP server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use anyhow::{Context, Result};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;
use webrace_client::Scraper;
use webrace_core::AppConfig;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    tracing::info!(
        mode = ?config.fetch_mode,
        crawl = ?config.crawl_mode,
        render = config.render_enabled,
        "Starting webrace server on stdio transport"
    );

    let scraper = Scraper::from_config(&config).context("failed to initialise fetch strategies")?;
    let handler = handler::WebraceServer::new(scraper.clone());
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    let quit = server.waiting().await;
    scraper.shutdown();
    quit?;

    Ok(())
}
