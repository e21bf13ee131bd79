//! Session model
//!
//! A session maps the digest of an opaque cookie token to exactly one user.
//! The plaintext token only ever lives in the client's cookie.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE sessions (
//!     token_hash CHAR(64) PRIMARY KEY,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     expires_at TIMESTAMPTZ NOT NULL
//! );
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-side login session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Hex HMAC-SHA256 digest of the cookie token
    pub token_hash: String,

    /// The one user this session authenticates
    pub user_id: Uuid,

    /// When the session was issued
    pub created_at: DateTime<Utc>,

    /// Fixed expiry, `created_at + ttl`
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Creates a session issued at `now` that expires after `ttl`
    pub fn issue(token_hash: String, user_id: Uuid, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            token_hash,
            user_id,
            created_at: now,
            expires_at: now + ttl,
        }
    }

    /// Whether the session is still valid at `now`
    ///
    /// The window is half-open: a session is dead at exactly `expires_at`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
