//! # Onboardly API Server Library
//!
//! Everything the `onboardly-api` binary runs, exposed as a library so the
//! integration tests and the client's end-to-end tests can build the same
//! router.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration loading and validation
//! - `error`: Error handling and HTTP response mapping
//! - `middleware`: Security headers
//! - `reaper`: Background purge of expired sessions
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod reaper;
pub mod routes;
