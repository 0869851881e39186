//! Data models for the Questline backend

use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub mod auth;
pub use auth::*;

/// Principal record owned by the user store
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub wallet_address: String,
    pub username: String,
    pub avatar: Option<String>,
    pub points: i64,
    pub referral_code: String,
    pub is_admin: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields supplied by the auth layer when a principal is first created.
/// The store assigns id, referral code and timestamps.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub wallet_address: String,
    pub username: String,
}

/// User response (sanitized for API)
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub wallet_address: String,
    pub username: String,
    pub avatar: Option<String>,
    pub points: i64,
    pub referral_code: String,
    pub is_admin: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            wallet_address: user.wallet_address,
            username: user.username,
            avatar: user.avatar,
            points: user.points,
            referral_code: user.referral_code,
            is_admin: user.is_admin,
            last_login_at: user.last_login_at,
            created_at: user.created_at,
        }
    }
}

/// Request to update the caller's profile
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 3, max = 32), custom = "validate_username")]
    pub username: Option<String>,
    #[validate(length(max = 512))]
    pub avatar: Option<String>,
}

fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("username_charset"))
    }
}
