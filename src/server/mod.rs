//! HTTP surface over the measurement engine.

mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tracing::info;

use crate::Result;
use crate::history::HistoryStore;
use crate::measure::Orchestrator;

#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub history: Arc<HistoryStore>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/measure", post(handlers::measure))
        .route("/history", get(handlers::history))
        .route("/stats", get(handlers::stats))
        .route("/healthz", get(handlers::healthz))
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "carbonpost listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}
