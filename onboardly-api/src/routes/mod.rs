/// API route handlers
///
/// - `health`: health check
/// - `users`: registration, login, logout, profiles
/// - `companies`: companies (the tenant boundary)
/// - `resources`: generic handlers for company-owned documents
/// - `extract`: request extractors shared by the handlers

pub mod companies;
pub mod extract;
pub mod health;
pub mod resources;
pub mod users;
