//! showroom server entry point.
//!
//! Boots the cache controller and compute dispatcher, then serves MCP on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use showroom_client::{CacheController, ControllerConfig, FetchClient, FetchConfig};
use showroom_compute::Compute;
use showroom_core::{AppConfig, CacheDb};
use tracing_subscriber::EnvFilter;

mod error;
mod handler;
mod state;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(version = %config.cache_version, origin = %config.origin, "Starting showroom server on stdio transport");

    let db = CacheDb::open(&config.db_path).await?;
    let network = Arc::new(FetchClient::new(FetchConfig::from(&config))?);
    let controller = CacheController::new(ControllerConfig::from_app(&config)?, db, network);

    match controller.start().await {
        Ok(deleted) => tracing::info!("controller active, removed {} stale caches", deleted.len()),
        Err(e) => tracing::warn!("controller did not activate, requests go straight to the network: {}", e),
    }

    let compute = if config.worker_enabled { Compute::background(config.dispatch_timeout()) } else { Compute::inline() };

    let handler = handler::ShowroomServer::new(Arc::new(state::AppState { controller, compute }));
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;

    Ok(())
}
