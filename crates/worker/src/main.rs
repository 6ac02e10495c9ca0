//! folio-sw entry point.
//!
//! Boots the offline cache and serves host events over stdio. Logging goes
//! to stderr so it never mixes with replies on stdout.

use std::sync::Arc;

use anyhow::Result;
use folio_client::{FetchClient, FetchConfig};
use folio_core::{AppConfig, CacheDb};
use folio_worker::{OfflineWorker, host};
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(origin = %config.origin, version = %config.cache_version, db = %config.db_path.display(), "starting folio-sw");

    let db = CacheDb::open_configured(&config).await?;
    let network = FetchClient::new(FetchConfig::from(&config))?;
    let worker = OfflineWorker::new(config, db, network)?;

    host::run(Arc::new(worker), BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await?;

    Ok(())
}
