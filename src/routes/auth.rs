//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::auth;
use crate::state::AppState;

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/nonce", get(auth::request_nonce))
        .route("/auth/login", post(auth::login))
        .route(
            "/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
}
