//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::AuthService;
use crate::store::UserStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub user_store: Arc<dyn UserStore>,
}

impl AppState {
    pub fn new(auth_service: Arc<AuthService>, user_store: Arc<dyn UserStore>) -> Self {
        Self {
            auth_service,
            user_store,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.auth_service.clone()
    }
}
