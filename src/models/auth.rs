//! Authentication request/response DTOs

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use validator::Validate;

use super::UserResponse;

/// Query for `GET /auth/nonce`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonceQuery {
    pub wallet_address: Option<String>,
}

/// Response containing the authentication challenge
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponse {
    pub nonce: String,
    pub message: String,
    pub expires_at: DateTime<Utc>,
}

/// Request to log in with a signed challenge
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[validate(required, length(min = 1))]
    pub wallet_address: Option<String>,
    /// Base58-encoded ed25519 signature over the challenge message
    #[validate(required, length(min = 1))]
    pub signature: Option<String>,
}

/// Successful login
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserResponse,
}
