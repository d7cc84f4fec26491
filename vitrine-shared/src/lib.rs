//! # Vitrine Shared Library
//!
//! This crate contains shared types, utilities, and business logic used across
//! the Vitrine API server and integration tests.
//!
//! ## Module Organization
//!
//! - `models`: Database models and CRUD operations
//! - `auth`: Password hashing, JWT tokens, auth context
//! - `db`: Connection pool and migration runner
//! - `events`: Store change events and stream-key scheme
//! - `redis`: Redis client, event publisher, and stream subscriber
//! - `payments`: PayU hash generation and callback verification
//! - `slug`: URL-safe identifiers derived from titles

pub mod auth;
pub mod db;
pub mod events;
pub mod models;
pub mod payments;
pub mod redis;
pub mod slug;

/// Current version of the Vitrine shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
