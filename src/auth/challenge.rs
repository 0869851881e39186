//! Human-signable login challenges
//!
//! The message template is part of the wire contract: wallets sign these
//! exact bytes, so any change here breaks every client.

use std::sync::Arc;

use super::address::WalletAddress;
use super::nonce::{Challenge, NonceRegistry};

/// Default application name embedded in the challenge message
pub const DEFAULT_APP_NAME: &str = "Questline";

/// A challenge ready to be shown to the wallet
#[derive(Debug, Clone)]
pub struct SignableChallenge {
    pub challenge: Challenge,
    pub message: String,
}

/// Issues nonces and wraps them in the message the wallet signs
pub struct ChallengeService {
    registry: Arc<NonceRegistry>,
    app_name: String,
}

impl ChallengeService {
    pub fn new(registry: Arc<NonceRegistry>, app_name: impl Into<String>) -> Self {
        Self {
            registry,
            app_name: app_name.into(),
        }
    }

    /// Issue a nonce for `address` and build its message
    pub fn create_challenge(&self, address: &WalletAddress) -> SignableChallenge {
        let challenge = self.registry.issue(address);
        let message = self.message_for(&challenge.nonce);

        SignableChallenge { challenge, message }
    }

    /// Message text for a given nonce
    pub fn message_for(&self, nonce: &str) -> String {
        format!(
            "Sign this message to authenticate with {}: {}",
            self.app_name, nonce
        )
    }

    pub fn registry(&self) -> &Arc<NonceRegistry> {
        &self.registry
    }
}
