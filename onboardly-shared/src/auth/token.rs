/// Session token generation and digests
///
/// A session token is an opaque random string that only ever lives in the
/// client's cookie. The server stores an HMAC-SHA256 digest of it keyed by
/// the session secret, so a leaked sessions table cannot be replayed and
/// rotating the secret invalidates every session at once.
///
/// # Format
///
/// 43 characters of `[A-Za-z0-9]` (about 256 bits of entropy).

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Length of a session token
pub const SESSION_TOKEN_LENGTH: usize = 43;

/// Shortest session secret accepted
pub const MIN_SECRET_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("Session secret must be at least 32 bytes, got {0}")]
    SecretTooShort(usize),

    #[error("Invalid session secret: {0}")]
    InvalidSecret(String),
}

/// Generates a new random session token
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();

    (0..SESSION_TOKEN_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}

/// Quick shape check run before any store lookup
pub fn validate_session_token_format(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Keyed digest for session tokens
#[derive(Clone)]
pub struct SessionKey {
    mac: HmacSha256,
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey(..)")
    }
}

impl SessionKey {
    /// Builds the key from the session secret
    ///
    /// # Errors
    ///
    /// Returns `TokenError::SecretTooShort` for secrets under 32 bytes.
    pub fn new(secret: &[u8]) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(TokenError::SecretTooShort(secret.len()));
        }

        let mac = HmacSha256::new_from_slice(secret)
            .map_err(|e| TokenError::InvalidSecret(e.to_string()))?;

        Ok(Self { mac })
    }

    /// Hex-encoded HMAC-SHA256 of `token` (64 characters)
    pub fn digest(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}
