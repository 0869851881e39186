//! Pending login challenges keyed by wallet address
//!
//! At most one challenge is live per address; issuing again replaces the old
//! one. Expiry is decided at lookup/consume time against the injected clock,
//! and expired entries are swept lazily whenever a new nonce is issued.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rand::Rng;
use std::sync::Arc;

use super::address::WalletAddress;
use crate::clock::Clock;

/// Default challenge lifetime
pub const DEFAULT_NONCE_TTL_SECONDS: i64 = 300;

/// A nonce handed out to a wallet, waiting to be signed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Challenge {
    pub wallet_address: String,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Challenge {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Result of looking up the pending challenge for an address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NonceLookup {
    Missing,
    Expired,
    Live(Challenge),
}

/// In-memory nonce store
pub struct NonceRegistry {
    entries: DashMap<String, Challenge>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl NonceRegistry {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Issue a fresh nonce for `address`, replacing any pending one
    pub fn issue(&self, address: &WalletAddress) -> Challenge {
        let now = self.clock.now();
        self.purge_expired(now);

        let challenge = Challenge {
            wallet_address: address.normalized().to_string(),
            nonce: generate_secure_nonce(),
            issued_at: now,
            expires_at: now + self.ttl,
        };

        self.entries
            .insert(address.normalized().to_string(), challenge.clone());

        tracing::debug!(wallet = %address, expires_at = %challenge.expires_at, "Nonce issued");

        challenge
    }

    /// Inspect the pending challenge without consuming it
    pub fn lookup(&self, address: &WalletAddress) -> NonceLookup {
        let now = self.clock.now();

        match self.entries.get(address.normalized()) {
            None => NonceLookup::Missing,
            Some(entry) if entry.is_expired_at(now) => NonceLookup::Expired,
            Some(entry) => NonceLookup::Live(entry.value().clone()),
        }
    }

    /// Remove the pending challenge if it has expired. Returns whether
    /// anything was removed.
    pub fn discard_expired(&self, address: &WalletAddress) -> bool {
        let now = self.clock.now();
        self.entries
            .remove_if(address.normalized(), |_, challenge| {
                challenge.is_expired_at(now)
            })
            .is_some()
    }

    /// Atomically remove the challenge if `nonce` matches and is still live.
    ///
    /// Returns false and leaves the registry untouched otherwise.
    pub fn consume(&self, address: &WalletAddress, nonce: &str) -> bool {
        let now = self.clock.now();
        self.entries
            .remove_if(address.normalized(), |_, challenge| {
                challenge.nonce == nonce && !challenge.is_expired_at(now)
            })
            .is_some()
    }

    /// Number of entries currently held, expired or not
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn purge_expired(&self, now: DateTime<Utc>) {
        self.entries
            .retain(|_, challenge| !challenge.is_expired_at(now));
    }
}

/// Generate a cryptographically secure nonce
fn generate_secure_nonce() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}
