//! # Taskhub Shared Library
//!
//! This crate contains the types and business logic shared by the Taskhub
//! API server: database models, connection pooling, and the authentication
//! and authorization primitives.
//!
//! ## Module Organization
//!
//! - `models`: Database models and their CRUD operations
//! - `auth`: Password hashing, JWT tokens, request auth context, and the
//!   access-control policy
//! - `db`: Connection pool and migration runner

pub mod auth;
pub mod db;
pub mod models;

/// Current version of the Taskhub shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
