//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    status: String,
    store: String,
    version: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let (status, store) = match state.user_store.check_health().await {
        Ok(()) => ("healthy", "connected".to_string()),
        Err(e) => {
            tracing::error!(error = %e, "User store health check failed");
            ("unhealthy", "unavailable".to_string())
        }
    };

    Json(HealthResponse {
        status: status.to_string(),
        store,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}
