//! Authentication module for Questline
//!
//! Provides wallet-based authentication:
//! - Challenge-response login with single-use nonces
//! - ed25519 signature verification of base58 wallet keys
//! - Stateless HS256 session tokens

mod address;
mod challenge;
mod crypto;
mod jwt;
mod nonce;
mod service;

pub use address::WalletAddress;
pub use challenge::{ChallengeService, SignableChallenge, DEFAULT_APP_NAME};
pub use crypto::{verify_wallet_signature, CryptoError};
pub use jwt::{Claims, TokenError, TokenService, DEFAULT_SESSION_TTL_SECONDS};
pub use nonce::{Challenge, NonceLookup, NonceRegistry, DEFAULT_NONCE_TTL_SECONDS};
pub use service::{AuthError, AuthService, LoginOutcome};
