//! Route definitions for the Questline API

mod admin;
mod auth;

use axum::{routing::get, Router};

use crate::handlers::health::health_check;
use crate::middleware::request_tracing;
use crate::state::AppState;

pub use admin::admin_routes;
pub use auth::auth_routes;

/// Build the application router with request tracing applied
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(auth_routes())
        .merge(admin_routes())
        .with_state(state)
        .layer(axum::middleware::from_fn(request_tracing))
}
