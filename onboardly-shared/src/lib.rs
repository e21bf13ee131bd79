//! # Onboardly Shared Library
//!
//! This crate contains shared types, persistence, and authentication plumbing
//! used by the Onboardly API server and its client library.
//!
//! ## Module Organization
//!
//! - `envelope`: The `{success, data|error}` JSON body every route returns
//! - `models`: Users, companies, sessions, and company-owned resources
//! - `store`: Store traits with Postgres and in-memory backends
//! - `db`: PostgreSQL pool and migrations
//! - `auth`: Password hashing, session tokens, authentication strategies,
//!   the session middleware, and authorization checks

pub mod auth;
pub mod db;
pub mod envelope;
pub mod models;
pub mod store;

/// Current version of the Onboardly shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
