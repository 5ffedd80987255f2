//! leaflet server entry point.
//!
//! Boots the offline cache worker and exposes its events as MCP tools on stdio.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use leaflet_client::{FetchClient, FetchConfig, RecordingHost, Worker, WorkerConfig};
use leaflet_core::{AppConfig, CacheDb};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    let worker_config = WorkerConfig::from_app_config(&config)?;
    let cache = CacheDb::open(&config.db_path).await?;
    let fetcher = FetchClient::new(FetchConfig::from(&config))?;
    let host = Arc::new(RecordingHost::new());

    tracing::info!(
        cache = %worker_config.cache_name,
        origin = %worker_config.origin,
        db = %config.db_path.display(),
        "Starting leaflet worker on stdio transport"
    );

    let worker = Worker::new(worker_config, Arc::new(fetcher), Arc::new(cache.clone()), host.clone());
    let handler = handler::LeafletServer::new(Arc::new(worker), host, cache);
    let server = serve_server(handler, stdio()).await?;

    server.waiting().await?;

    Ok(())
}
