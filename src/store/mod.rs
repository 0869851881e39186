//! Principal (user) persistence
//!
//! The auth layer only needs lookup by wallet or id, create-if-absent and
//! save. Both implementations enforce uniqueness on wallet address, username
//! and referral code and report violations as [`StoreError::Conflict`].

use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, User};

mod memory;
mod postgres;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

/// Unique columns of the user record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    WalletAddress,
    Username,
    ReferralCode,
}

impl fmt::Display for UniqueField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UniqueField::WalletAddress => "wallet_address",
            UniqueField::Username => "username",
            UniqueField::ReferralCode => "referral_code",
        };
        f.write_str(name)
    }
}

/// Store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Duplicate value for unique field {0}")]
    Conflict(UniqueField),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// External principal store
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_wallet_address(&self, wallet_address: &str)
        -> Result<Option<User>, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Create a principal. Fails with `Conflict(WalletAddress)` if one
    /// already exists for the address.
    async fn create(&self, new_user: NewUser) -> Result<User, StoreError>;

    /// Persist changes to an existing principal and return the stored row
    async fn save(&self, user: &User) -> Result<User, StoreError>;

    async fn check_health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

const REFERRAL_CODE_LENGTH: usize = 8;
const REFERRAL_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Random referral code of upper-case letters and digits
pub(crate) fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LENGTH)
        .map(|_| char::from(REFERRAL_ALPHABET[rng.gen_range(0..REFERRAL_ALPHABET.len())]))
        .collect()
}
