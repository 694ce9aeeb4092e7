//! Otto daemon - vehicle-diagnosis service.
//!
//! Scores problem reports against the fault catalog, runs the follow-up
//! protocol, and tracks fix outcomes over the HTTP API.

use anyhow::Result;
use ottod::config::OttodConfig;
use ottod::server::{self, AppState};
use ottod::storage::CaseStore;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("ottod v{} starting", env!("CARGO_PKG_VERSION"));

    let config = OttodConfig::load();
    let store = CaseStore::open(&config.db_path).await?;
    info!(
        "Catalog loaded: {} candidates",
        otto_common::CATALOG.len()
    );

    let state = AppState::new(store);
    server::run(state, &config.listen_addr).await
}
