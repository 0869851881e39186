//! Wallet signature verification
//!
//! Verifies ed25519 signatures over UTF-8 challenge messages. Public keys and
//! signatures arrive base58-encoded.

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

const PUBLIC_KEY_LENGTH: usize = 32;
const SIGNATURE_LENGTH: usize = 64;

/// Errors that can occur while decoding verification inputs
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid base58 encoding: {0}")]
    InvalidEncoding(String),

    #[error("Invalid public key length: expected 32 bytes, got {0}")]
    InvalidPublicKeyLength(usize),

    #[error("Invalid signature length: expected 64 bytes, got {0}")]
    InvalidSignatureLength(usize),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Signature verification failed")]
    VerificationFailed,
}

/// Verify a wallet signature over `message`
///
/// # Arguments
/// * `message` - The exact text that was signed
/// * `signature_b58` - Base58-encoded 64-byte signature
/// * `public_key_b58` - Base58-encoded 32-byte ed25519 public key
///
/// # Returns
/// `true` only if every input decodes and the signature checks out.
pub fn verify_wallet_signature(message: &str, signature_b58: &str, public_key_b58: &str) -> bool {
    match try_verify(message, signature_b58, public_key_b58) {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!(error = %e, "Wallet signature rejected");
            false
        }
    }
}

fn try_verify(message: &str, signature_b58: &str, public_key_b58: &str) -> Result<(), CryptoError> {
    let public_key = decode_public_key(public_key_b58)?;
    let signature = decode_signature(signature_b58)?;

    let verifying_key = VerifyingKey::from_bytes(&public_key)
        .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;

    verifying_key
        .verify(message.as_bytes(), &Signature::from_bytes(&signature))
        .map_err(|_| CryptoError::VerificationFailed)
}

/// Decode a base58 public key into its 32 raw bytes
pub fn decode_public_key(encoded: &str) -> Result<[u8; PUBLIC_KEY_LENGTH], CryptoError> {
    let bytes = decode_base58(encoded)?;
    <[u8; PUBLIC_KEY_LENGTH]>::try_from(bytes.as_slice())
        .map_err(|_| CryptoError::InvalidPublicKeyLength(bytes.len()))
}

/// Decode a base58 signature into its 64 raw bytes
pub fn decode_signature(encoded: &str) -> Result<[u8; SIGNATURE_LENGTH], CryptoError> {
    let bytes = decode_base58(encoded)?;
    <[u8; SIGNATURE_LENGTH]>::try_from(bytes.as_slice())
        .map_err(|_| CryptoError::InvalidSignatureLength(bytes.len()))
}

fn decode_base58(encoded: &str) -> Result<Vec<u8>, CryptoError> {
    bs58::decode(encoded)
        .into_vec()
        .map_err(|e| CryptoError::InvalidEncoding(e.to_string()))
}
