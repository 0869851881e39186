//! Authentication service
//!
//! Core business logic for wallet-based login and session checks.

use rand::Rng;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::clock::Clock;
use crate::models::{LoginRequest, NewUser, UpdateProfileRequest, User};
use crate::store::{StoreError, UniqueField, UserStore};

use super::address::WalletAddress;
use super::challenge::{ChallengeService, SignableChallenge};
use super::crypto::verify_wallet_signature;
use super::jwt::{TokenError, TokenService};
use super::nonce::NonceLookup;

/// Attempts at creating a principal before giving up on username clashes
const MAX_CREATE_ATTEMPTS: usize = 3;

/// Auth service errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),

    #[error("no nonce found")]
    NoNonce,

    #[error("nonce expired")]
    NonceExpired,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid token")]
    TokenInvalid,

    #[error("token expired")]
    TokenExpired,

    #[error("user not found")]
    UserNotFound,

    #[error("admin access required")]
    Forbidden,

    #[error("{0} already taken")]
    Conflict(UniqueField),

    #[error("persistence error: {0}")]
    Persistence(String),
}

impl From<StoreError> for AuthError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict(field) => AuthError::Conflict(field),
            StoreError::Backend(detail) => AuthError::Persistence(detail),
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Expired => AuthError::TokenExpired,
            TokenError::Invalid => AuthError::TokenInvalid,
            TokenError::EncodingFailed(detail) => AuthError::Persistence(detail),
        }
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(e: validator::ValidationErrors) -> Self {
        AuthError::Validation(e.to_string())
    }
}

/// A successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Authentication service
pub struct AuthService {
    challenges: ChallengeService,
    tokens: TokenService,
    store: Arc<dyn UserStore>,
    clock: Arc<dyn Clock>,
}

impl AuthService {
    /// Create a new AuthService
    pub fn new(
        challenges: ChallengeService,
        tokens: TokenService,
        store: Arc<dyn UserStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            challenges,
            tokens,
            store,
            clock,
        }
    }

    /// Issue a challenge for a wallet
    pub fn generate_challenge(
        &self,
        wallet_address: Option<&str>,
    ) -> Result<SignableChallenge, AuthError> {
        let address = wallet_address
            .and_then(WalletAddress::parse)
            .ok_or_else(|| AuthError::Validation("walletAddress is required".to_string()))?;

        Ok(self.challenges.create_challenge(&address))
    }

    /// Verify a signed challenge, find or create the principal and mint a
    /// session token.
    ///
    /// A bad signature leaves the nonce in place so the client may retry
    /// until it expires.
    pub async fn login(&self, request: &LoginRequest) -> Result<LoginOutcome, AuthError> {
        request.validate()?;
        let (Some(raw_address), Some(signature)) =
            (request.wallet_address.as_deref(), request.signature.as_deref())
        else {
            return Err(AuthError::Validation(
                "walletAddress and signature are required".to_string(),
            ));
        };
        let address = WalletAddress::parse(raw_address)
            .ok_or_else(|| AuthError::Validation("walletAddress is required".to_string()))?;

        let registry = self.challenges.registry();
        let challenge = match registry.lookup(&address) {
            NonceLookup::Missing => return Err(AuthError::NoNonce),
            NonceLookup::Expired => {
                registry.discard_expired(&address);
                tracing::warn!(wallet = %address, "Login attempted with expired nonce");
                return Err(AuthError::NonceExpired);
            }
            NonceLookup::Live(challenge) => challenge,
        };

        let message = self.challenges.message_for(&challenge.nonce);
        if !verify_wallet_signature(&message, signature, address.as_raw()) {
            tracing::warn!(wallet = %address, "Login rejected: invalid signature");
            return Err(AuthError::InvalidSignature);
        }

        // A concurrent login or a re-issue may have claimed the nonce since lookup
        if !registry.consume(&address, &challenge.nonce) {
            return Err(AuthError::NoNonce);
        }

        let mut user = self.find_or_create_user(&address).await?;
        user.last_login_at = Some(self.clock.now());
        let user = self.store.save(&user).await?;

        let token = self.tokens.issue(user.id)?;

        tracing::info!(user_id = %user.id, wallet = %address, "User logged in");

        Ok(LoginOutcome { token, user })
    }

    /// Resolve a bearer token to its principal
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let user_id = self.tokens.validate(token)?;

        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Get a user by ID
    pub async fn get_user_by_id(&self, user_id: Uuid) -> Result<User, AuthError> {
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Apply a profile update for `user_id`
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        update: &UpdateProfileRequest,
    ) -> Result<User, AuthError> {
        update.validate()?;

        let mut user = self.get_user_by_id(user_id).await?;
        if let Some(username) = &update.username {
            user.username = username.clone();
        }
        if let Some(avatar) = &update.avatar {
            user.avatar = Some(avatar.clone());
        }

        Ok(self.store.save(&user).await?)
    }

    /// Session token lifetime in seconds
    pub fn session_ttl_seconds(&self) -> i64 {
        self.tokens.ttl().num_seconds()
    }

    /// Get or create a user by wallet address.
    ///
    /// Safe under concurrent first logins: losing the create race surfaces as
    /// a wallet-address conflict, after which the winner's row is re-read.
    async fn find_or_create_user(&self, address: &WalletAddress) -> Result<User, AuthError> {
        if let Some(user) = self
            .store
            .find_by_wallet_address(address.normalized())
            .await?
        {
            return Ok(user);
        }

        let base_username = default_username(address);
        let mut last_conflict = UniqueField::Username;

        for attempt in 0..MAX_CREATE_ATTEMPTS {
            let username = if attempt == 0 {
                base_username.clone()
            } else {
                format!("{}_{:04x}", base_username, rand::thread_rng().gen::<u16>())
            };

            let new_user = NewUser {
                wallet_address: address.normalized().to_string(),
                username,
            };

            match self.store.create(new_user).await {
                Ok(user) => {
                    tracing::info!(user_id = %user.id, wallet = %address, "Created user");
                    return Ok(user);
                }
                Err(StoreError::Conflict(UniqueField::WalletAddress)) => {
                    tracing::debug!(wallet = %address, "User created concurrently, re-fetching");
                    return self
                        .store
                        .find_by_wallet_address(address.normalized())
                        .await?
                        .ok_or_else(|| {
                            AuthError::Persistence(format!(
                                "user for {} vanished after create conflict",
                                address
                            ))
                        });
                }
                Err(StoreError::Conflict(field)) => last_conflict = field,
                Err(e) => return Err(e.into()),
            }
        }

        Err(AuthError::Conflict(last_conflict))
    }
}

/// Initial username derived from the wallet address
fn default_username(address: &WalletAddress) -> String {
    let prefix: String = address.normalized().chars().take(8).collect();
    format!("user_{}", prefix)
}
