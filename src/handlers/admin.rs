//! Admin-only handlers

use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use super::AdminUser;
use crate::error::ApiResult;
use crate::models::UserResponse;
use crate::state::AppState;

/// GET /admin/users/:id - Look up any principal
pub async fn get_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<UserResponse>> {
    tracing::debug!(admin_id = %admin.id, %user_id, "Admin user lookup");

    let user = state.auth_service.get_user_by_id(user_id).await?;
    Ok(Json(user.into()))
}
