//! Admin routes

use axum::{routing::get, Router};

use crate::handlers::admin;
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/users/:id", get(admin::get_user))
}
