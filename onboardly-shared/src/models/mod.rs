//! Data models for Onboardly
//!
//! # Models
//!
//! - `user`: User accounts, roles, and the public projection sent to clients
//! - `session`: Server-side login sessions referenced by a cookie token
//! - `resource`: The `Resource` trait, document envelope, and typed records
//! - `company`: Companies (the tenant boundary)
//! - `job`, `project`, `task`, `responsibility`, `onboarding`, `faq`:
//!   company-owned resources stored as documents
//!
//! Users and sessions have dedicated tables. Every other model is a
//! [`resource::Resource`] persisted through the generic document store.

pub mod company;
pub mod faq;
pub mod job;
pub mod onboarding;
pub mod project;
pub mod resource;
pub mod responsibility;
pub mod session;
pub mod task;
pub mod user;
