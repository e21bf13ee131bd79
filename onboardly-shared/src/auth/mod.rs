/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and the password policy
/// - [`token`]: Session token generation and keyed digests
/// - [`strategy`]: Credential verification (`AuthStrategy`, `LocalStrategy`)
/// - [`middleware`]: Session layer, `Identity` and `CurrentUser` extractors
/// - [`authorization`]: Role and company checks
///
/// # Example
///
/// ```
/// use onboardly_shared::auth::password::{hash_password, verify_password};
/// use onboardly_shared::auth::token::{generate_session_token, SessionKey};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("secret1")?;
/// assert!(verify_password("secret1", &hash)?);
///
/// let key = SessionKey::new(b"0123456789abcdef0123456789abcdef")?;
/// let token = generate_session_token();
/// let stored = key.digest(&token);
/// assert_eq!(stored.len(), 64);
/// # Ok(())
/// # }
/// ```

pub mod authorization;
pub mod middleware;
pub mod password;
pub mod strategy;
pub mod token;
