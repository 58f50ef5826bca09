//! sotd-worker entry point.
//!
//! Boots the worker on the stdio transport. Logging goes to stderr so stdout
//! carries nothing but outcome lines.

use std::sync::Arc;

use anyhow::Result;
use tokio::io::{BufReader, stdin, stdout};
use tracing_subscriber::EnvFilter;

use sotd_client::{FetchClient, FetchConfig};
use sotd_core::{CacheDb, CacheRegistry, WorkerConfig};
use sotd_worker::host::{self, StdioNotifier, StdioScope};
use sotd_worker::{Ports, Worker, WorkerContext};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = WorkerConfig::load()?;
    tracing::info!(origin = %config.origin, "Starting sotd-worker on stdio transport");

    let registry = match &config.db_path {
        Some(path) => CacheRegistry::sqlite(CacheDb::open(path).await?),
        None => CacheRegistry::in_memory(),
    };

    let (replies, inbox) = host::channel();
    let ports = Ports {
        network: Arc::new(FetchClient::new(FetchConfig::from(&config))?),
        notifier: Arc::new(StdioNotifier::new(replies.clone())),
        scope: Arc::new(StdioScope::new(replies.clone())),
    };
    let worker = Arc::new(Worker::new(WorkerContext::new(&config, registry, ports)?));

    host::serve(worker, BufReader::new(stdin()), stdout(), replies, inbox).await?;

    Ok(())
}
