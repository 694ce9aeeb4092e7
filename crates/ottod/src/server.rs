//! HTTP server for ottod.

use crate::routes;
use crate::storage::CaseStore;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use std::time::Instant;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Application state shared across handlers.
pub struct AppState {
    pub store: CaseStore,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(store: CaseStore) -> Self {
        Self {
            store,
            start_time: Instant::now(),
        }
    }
}

/// Build the full router. Separate from [`run`] so tests can drive the API
/// without binding a socket.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(routes::case_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Run the HTTP server.
pub async fn run(state: AppState, addr: &str) -> Result<()> {
    let app = router(Arc::new(state));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("  Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
