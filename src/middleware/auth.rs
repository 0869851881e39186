//! Authentication middleware
//!
//! Extractors that resolve the bearer token to a principal and gate admin
//! routes.

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use serde::Serialize;
use std::sync::Arc;

use crate::auth::{AuthError, AuthService};
use crate::error::ApiError;
use crate::models::User;

/// Authenticated principal attached to the request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

/// Error response for authentication failures
#[derive(Debug, Serialize)]
struct AuthRejection {
    #[serde(skip)]
    status: StatusCode,
    error: AuthRejectionDetails,
}

#[derive(Debug, Serialize)]
struct AuthRejectionDetails {
    code: &'static str,
    message: &'static str,
}

impl AuthRejection {
    fn unauthorized(code: &'static str, message: &'static str) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: AuthRejectionDetails { code, message },
        }
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// Extractor for authenticated users
///
/// Verifies the bearer token from the Authorization header and loads the
/// principal it was issued for. Deleted principals are rejected like bad
/// tokens.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(AuthenticatedUser(user): AuthenticatedUser) -> impl IntoResponse {
///     format!("Hello, {}", user.username)
/// }
/// ```
#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| {
                    AuthRejection::unauthorized(
                        "MISSING_TOKEN",
                        "Authorization header with Bearer token required",
                    )
                    .into_response()
                })?;

        let auth_service = Arc::<AuthService>::from_ref(state);

        let user = auth_service
            .authenticate(bearer.token())
            .await
            .map_err(|e| {
                tracing::debug!(error = %e, "Request authentication failed");
                match e {
                    AuthError::TokenExpired => {
                        AuthRejection::unauthorized("TOKEN_EXPIRED", "Token has expired")
                            .into_response()
                    }
                    AuthError::TokenInvalid => {
                        AuthRejection::unauthorized("INVALID_TOKEN", "Invalid token")
                            .into_response()
                    }
                    AuthError::UserNotFound => {
                        AuthRejection::unauthorized("USER_NOT_FOUND", "Account no longer exists")
                            .into_response()
                    }
                    other => ApiError::from(other).into_response(),
                }
            })?;

        Ok(AuthenticatedUser(user))
    }
}

/// Extractor that additionally requires the admin flag
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    Arc<AuthService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let AuthenticatedUser(user) = AuthenticatedUser::from_request_parts(parts, state).await?;

        if !user.is_admin {
            tracing::warn!(user_id = %user.id, "Non-admin denied admin route");
            return Err(ApiError::from(AuthError::Forbidden).into_response());
        }

        Ok(AdminUser(user))
    }
}
