//! Authentication HTTP handlers
//!
//! Endpoints for wallet-based login and the caller's profile.

use axum::{
    extract::{Query, State},
    Json,
};

use super::AuthenticatedUser;
use crate::error::{ApiResult, JsonBody};
use crate::models::{
    ChallengeResponse, LoginRequest, LoginResponse, NonceQuery, UpdateProfileRequest,
    UserResponse,
};
use crate::state::AppState;

/// GET /auth/nonce - Request a nonce for wallet authentication
pub async fn request_nonce(
    State(state): State<AppState>,
    Query(query): Query<NonceQuery>,
) -> ApiResult<Json<ChallengeResponse>> {
    let signable = state
        .auth_service
        .generate_challenge(query.wallet_address.as_deref())?;

    Ok(Json(ChallengeResponse {
        nonce: signable.challenge.nonce,
        message: signable.message,
        expires_at: signable.challenge.expires_at,
    }))
}

/// POST /auth/login - Verify signed nonce and issue a session token
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    let outcome = state.auth_service.login(&req).await?;

    Ok(Json(LoginResponse {
        token: outcome.token,
        token_type: "Bearer".to_string(),
        expires_in: state.auth_service.session_ttl_seconds(),
        user: outcome.user.into(),
    }))
}

/// GET /auth/profile - Get the current authenticated user
pub async fn get_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth_service.get_user_by_id(user.id).await?;

    Ok(Json(user.into()))
}

/// PUT /auth/profile - Update username and/or avatar
pub async fn update_profile(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    JsonBody(req): JsonBody<UpdateProfileRequest>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.auth_service.update_profile(user.id, &req).await?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(Json(user.into()))
}
