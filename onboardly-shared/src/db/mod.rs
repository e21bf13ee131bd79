//! PostgreSQL plumbing for the Postgres store backend
//!
//! - `pool`: connection pool creation, health checks, shutdown
//! - `migrations`: schema migrations embedded from `migrations/`
//!
//! The stores themselves live in [`crate::store::postgres`].

pub mod migrations;
pub mod pool;
