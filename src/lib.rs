//! Questline Backend Library
//!
//! Wallet-based challenge/response authentication for the Questline quest
//! platform: nonce issuance, ed25519 signature checks, session tokens and the
//! request extractors that gate authenticated routes.

pub mod auth;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
