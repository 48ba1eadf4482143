//! Route configuration for the sirenvault API.

use std::sync::Arc;

use axum::routing::{get, post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{alert_history, health_check, ingest_webhook, metrics_snapshot};
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Ingestion
        .route("/webhook", post(ingest_webhook))
        // History query
        .route("/alerts/{id}/history", get(alert_history))
        // Liveness
        .route("/health", get(health_check))
        // Process counters
        .route("/metrics", get(metrics_snapshot))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
