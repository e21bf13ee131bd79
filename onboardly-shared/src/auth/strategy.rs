//! Pluggable credential verification
//!
//! The login handler asks an [`AuthStrategy`] whether a set of credentials
//! identifies a user. [`LocalStrategy`] checks an email and an Argon2id
//! password hash from the [`UserStore`].
//!
//! Unknown email and wrong password are deliberately indistinguishable: both
//! return `Ok(None)`, and an unknown email still pays for one hash
//! verification against [`dummy_hash`].

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use validator::Validate;

use super::middleware::AuthError;
use super::password::{dummy_hash, verify_password};
use crate::models::user::User;
use crate::store::UserStore;

/// Login form body
#[derive(Clone, Deserialize, Validate)]
pub struct Credentials {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Returns the user the credentials identify, or `None` if they don't match
    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<User>, AuthError>;
}

/// Email + password against the user store
pub struct LocalStrategy {
    users: Arc<dyn UserStore>,
}

impl LocalStrategy {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("Password verification task failed: {}", e)))?
        .map_err(AuthError::from)
}

/// Spends one verification on an unknown email; never fails the login
async fn verify_dummy_blocking(password: String) {
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, dummy_hash())).await;

    match verified {
        Ok(Ok(_)) => {}
        Ok(Err(err)) => tracing::error!(error = %err, "Dummy password hash is unusable"),
        Err(err) => tracing::error!(error = %err, "Password verification task failed"),
    }
}

/// Computes the dummy hash off the async workers so the first unknown-email
/// login does not pay for it
pub async fn warm_up() {
    if let Err(err) = tokio::task::spawn_blocking(dummy_hash).await {
        tracing::warn!(error = %err, "Failed to precompute dummy password hash");
    }
}

#[async_trait]
impl AuthStrategy for LocalStrategy {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn authenticate(&self, credentials: &Credentials) -> Result<Option<User>, AuthError> {
        let password = credentials.password.clone();

        let Some(user) = self.users.find_by_email(&credentials.email).await? else {
            verify_dummy_blocking(password).await;
            return Ok(None);
        };

        match verify_blocking(password, user.password_hash.clone()).await {
            Ok(true) => Ok(Some(user)),
            Ok(false) => Ok(None),
            Err(AuthError::Password(err)) => {
                // An unreadable stored hash can never match
                tracing::error!(user_id = %user.id, error = %err, "Stored password hash is unusable");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }
}
