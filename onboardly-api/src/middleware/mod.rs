/// Middleware for the API server
///
/// - `security`: security response headers
///
/// The session layer itself lives in `onboardly_shared::auth::middleware`.

pub mod security;
