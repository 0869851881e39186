//! Middleware for the Questline API
//!
//! This module provides request tracing and the authentication extractors.

pub mod auth;
mod tracing;

pub use auth::{AdminUser, AuthenticatedUser};
pub use self::tracing::request_tracing;
