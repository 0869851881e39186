//! Wallet address handling
//!
//! Addresses are compared and stored lower-cased. The raw form is kept
//! alongside because it doubles as the base58 public key, and base58 is
//! case sensitive.

use std::fmt;

/// A wallet address as submitted by a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAddress {
    raw: String,
    normalized: String,
}

impl WalletAddress {
    /// Parse a client-supplied address. Returns `None` for blank input.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().is_empty() {
            return None;
        }

        Some(Self {
            raw: raw.to_string(),
            normalized: raw.to_lowercase(),
        })
    }

    /// Address exactly as the client sent it (the encoded public key)
    pub fn as_raw(&self) -> &str {
        &self.raw
    }

    /// Lower-cased address used as the registry and store key
    pub fn normalized(&self) -> &str {
        &self.normalized
    }
}

impl fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.normalized)
    }
}
