//! API handlers for the Questline backend

pub mod admin;
pub mod auth;
pub mod health;

// Re-export extractors from middleware for handler use
pub use crate::middleware::auth::{AdminUser, AuthenticatedUser};
