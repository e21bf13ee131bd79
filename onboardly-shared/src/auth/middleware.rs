/// Session middleware and identity extractors
///
/// The session layer runs before every handler. It reads the session cookie,
/// resolves it to a user, and stores an [`Identity`] in the request
/// extensions. Handlers never look at the extensions directly; they use the
/// [`CurrentUser`] extractor (authenticated only) or [`Identity`] (either).
///
/// # Cookie
///
/// `onboardly.sid=<token>; Path=/; Max-Age=3600; SameSite=Lax; HttpOnly`
/// plus `Secure` in production. The token is opaque; only its keyed digest
/// is stored.
///
/// # Failure modes
///
/// - no cookie: anonymous
/// - malformed, unknown, or expired token: anonymous, and the response
///   carries a clearing `Set-Cookie`
/// - store failure: the request is answered with an error envelope
///
/// # Example
///
/// ```no_run
/// use axum::{middleware, routing::get, Router};
/// use onboardly_shared::auth::middleware::{session_middleware, CurrentUser, SessionManager};
///
/// async fn me(CurrentUser(user): CurrentUser) -> String {
///     user.user.email
/// }
///
/// fn router(manager: SessionManager) -> Router {
///     Router::new()
///         .route("/me", get(me))
///         .layer(middleware::from_fn_with_state(manager, session_middleware))
/// }
/// ```

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use super::password::PasswordError;
use super::token::{generate_session_token, validate_session_token_format, SessionKey};
use crate::envelope::{Envelope, ErrorBody};
use crate::models::session::Session;
use crate::models::user::{PublicUser, UserRole};
use crate::store::{SessionStore, StoreError, UserStore};

/// Errors raised while authenticating a request
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No valid session on a route that needs one
    #[error("Authentication required")]
    Unauthenticated,

    /// Login credentials did not match
    #[error("Incorrect email or password.")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error("Internal authentication error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::Unauthenticated | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AuthError::Unauthenticated => "unauthenticated",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::Store(StoreError::Unavailable(_)) => "service_unavailable",
            _ => "internal_error",
        }
    }

    /// Message safe to send to the client
    pub fn public_message(&self) -> String {
        match self {
            AuthError::Unauthenticated | AuthError::InvalidCredentials => self.to_string(),
            AuthError::Store(StoreError::Unavailable(_)) => {
                "Service temporarily unavailable".to_string()
            }
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Session resolution failed");
        }

        let body = Envelope::<()>::failure(ErrorBody::new(self.code(), self.public_message()));
        (status, Json(body)).into_response()
    }
}

/// The authenticated user behind a request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user: PublicUser,

    /// When the current session stops being valid
    pub expires_at: DateTime<Utc>,
}

impl AuthenticatedUser {
    pub fn id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn company_id(&self) -> Option<Uuid> {
        self.user.company_id
    }
}

/// Who is making the request
#[derive(Debug, Clone)]
pub enum Identity {
    Anonymous,
    Authenticated(AuthenticatedUser),
}

impl Identity {
    pub fn user(&self) -> Option<&AuthenticatedUser> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated(user) => Some(user),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated(_))
    }
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<Identity>()
            .cloned()
            .unwrap_or(Identity::Anonymous))
    }
}

/// Extractor for routes that require a logged-in user
///
/// Rejects anonymous requests with `401 unauthenticated`.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub AuthenticatedUser);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<Identity>() {
            Some(Identity::Authenticated(user)) => Ok(CurrentUser(user.clone())),
            _ => Err(AuthError::Unauthenticated),
        }
    }
}

/// Cookie and lifetime settings for sessions
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub cookie_name: String,

    /// Fixed lifetime of a session from the moment it is issued
    pub ttl: Duration,

    /// Adds `Secure` to the cookie
    pub secure: bool,

    /// Adds `HttpOnly` to the cookie
    pub http_only: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "onboardly.sid".to_string(),
            ttl: Duration::hours(1),
            secure: false,
            http_only: true,
        }
    }
}

/// A freshly issued session
#[derive(Debug, Clone)]
pub struct IssuedSession {
    /// Plaintext token for the cookie
    pub token: String,

    pub expires_at: DateTime<Utc>,
}

/// Issues, resolves, and revokes sessions
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    users: Arc<dyn UserStore>,
    key: SessionKey,
    settings: Arc<SessionSettings>,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        users: Arc<dyn UserStore>,
        key: SessionKey,
        settings: SessionSettings,
    ) -> Self {
        Self {
            sessions,
            users,
            key,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Starts a new session for `user_id`
    pub async fn issue(&self, user_id: Uuid) -> Result<IssuedSession, AuthError> {
        let token = generate_session_token();
        let session = Session::issue(self.key.digest(&token), user_id, Utc::now(), self.settings.ttl);
        let expires_at = session.expires_at;

        self.sessions.create(session).await?;
        tracing::debug!(user_id = %user_id, expires_at = %expires_at, "Session issued");

        Ok(IssuedSession { token, expires_at })
    }

    /// Resolves a cookie token to its user
    ///
    /// Returns `Ok(None)` for malformed, unknown, or expired tokens and for
    /// sessions whose user no longer exists.
    pub async fn resolve(&self, token: &str) -> Result<Option<AuthenticatedUser>, AuthError> {
        if !validate_session_token_format(token) {
            return Ok(None);
        }

        let digest = self.key.digest(token);
        let Some(session) = self.sessions.find_active(&digest, Utc::now()).await? else {
            return Ok(None);
        };

        match self.users.find_by_id(session.user_id).await? {
            Some(user) => Ok(Some(AuthenticatedUser {
                user: user.into(),
                expires_at: session.expires_at,
            })),
            None => {
                self.sessions.delete(&digest).await?;
                Ok(None)
            }
        }
    }

    /// Ends the session behind `token`; returns whether one existed
    pub async fn revoke(&self, token: &str) -> Result<bool, AuthError> {
        if !validate_session_token_format(token) {
            return Ok(false);
        }

        Ok(self.sessions.delete(&self.key.digest(token)).await?)
    }

    /// Ends every session of a user
    pub async fn revoke_all(&self, user_id: Uuid) -> Result<u64, AuthError> {
        Ok(self.sessions.delete_for_user(user_id).await?)
    }

    /// Reads the session token from the `Cookie` headers
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == self.settings.cookie_name)
            .map(|(_, value)| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    /// `Set-Cookie` value carrying a session token
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, AuthError> {
        self.cookie(token, self.settings.ttl.num_seconds())
    }

    /// `Set-Cookie` value that makes the browser drop the session cookie
    pub fn clear_cookie(&self) -> Result<HeaderValue, AuthError> {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> Result<HeaderValue, AuthError> {
        let mut cookie = format!(
            "{}={}; Path=/; Max-Age={}; SameSite=Lax",
            self.settings.cookie_name, value, max_age
        );
        if self.settings.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.settings.secure {
            cookie.push_str("; Secure");
        }

        HeaderValue::from_str(&cookie)
            .map_err(|e| AuthError::Internal(format!("Invalid session cookie: {}", e)))
    }
}

/// Resolves the session cookie into an [`Identity`] for the handler
///
/// Install with `axum::middleware::from_fn_with_state(manager, session_middleware)`.
pub async fn session_middleware(
    State(manager): State<SessionManager>,
    mut req: Request,
    next: Next,
) -> Response {
    let mut stale_cookie = false;

    let identity = match manager.token_from_headers(req.headers()) {
        None => Identity::Anonymous,
        Some(token) => match manager.resolve(&token).await {
            Ok(Some(user)) => Identity::Authenticated(user),
            Ok(None) => {
                tracing::debug!("Stale session cookie, continuing as anonymous");
                stale_cookie = true;
                Identity::Anonymous
            }
            Err(err) => return err.into_response(),
        },
    };

    req.extensions_mut().insert(identity);
    let mut response = next.run(req).await;

    // A handler that set its own cookie (login) wins over the clearing one.
    if stale_cookie && !response.headers().contains_key(header::SET_COOKIE) {
        match manager.clear_cookie() {
            Ok(value) => {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
            Err(err) => tracing::warn!(error = %err, "Could not build clearing cookie"),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::CreateUser;
    use crate::store::Stores;
    use axum::{body::Body, middleware, routing::get, Router};
    use tower::Service as _;

    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn manager(stores: &Stores) -> SessionManager {
        SessionManager::new(
            stores.sessions.clone(),
            stores.users.clone(),
            SessionKey::new(SECRET).unwrap(),
            SessionSettings::default(),
        )
    }

    async fn seed_user(stores: &Stores) -> Uuid {
        stores
            .users
            .create(CreateUser {
                email: "a@b.com".to_string(),
                password_hash: "hash".to_string(),
                name: None,
                role: UserRole::Employee,
                company_id: None,
            })
            .await
            .unwrap()
            .id
    }

    async fn whoami(identity: Identity) -> String {
        match identity {
            Identity::Anonymous => "anonymous".to_string(),
            Identity::Authenticated(user) => user.user.email,
        }
    }

    async fn private(CurrentUser(user): CurrentUser) -> String {
        user.id().to_string()
    }

    fn app(manager: SessionManager) -> Router {
        Router::new()
            .route("/whoami", get(whoami))
            .route("/private", get(private))
            .layer(middleware::from_fn_with_state(manager, session_middleware))
    }

    fn request(path: &str, cookie: Option<&str>) -> Request {
        let mut builder = axum::http::Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_no_cookie_is_anonymous() {
        let stores = Stores::in_memory();
        let mut app = app(manager(&stores));

        let response = app.call(request("/whoami", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_valid_cookie_resolves_user() {
        let stores = Stores::in_memory();
        let manager = manager(&stores);
        let user_id = seed_user(&stores).await;
        let issued = manager.issue(user_id).await.unwrap();
        let mut app = app(manager);

        let cookie = format!("theme=dark; onboardly.sid={}", issued.token);
        let response = app.call(request("/whoami", Some(&cookie))).await.unwrap();
        assert_eq!(body_text(response).await, "a@b.com");

        let response = app.call(request("/private", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, user_id.to_string());
    }

    #[tokio::test]
    async fn test_unknown_cookie_degrades_and_clears() {
        let stores = Stores::in_memory();
        let mut app = app(manager(&stores));

        let cookie = format!("onboardly.sid={}", "x".repeat(43));
        let response = app.call(request("/whoami", Some(&cookie))).await.unwrap();

        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap().to_string();
        assert!(set_cookie.starts_with("onboardly.sid=;"));
        assert!(set_cookie.contains("Max-Age=0"));
        assert_eq!(body_text(response).await, "anonymous");
    }

    #[tokio::test]
    async fn test_expired_session_is_absent() {
        let stores = Stores::in_memory();
        let manager = manager(&stores);
        let user_id = seed_user(&stores).await;

        let token = generate_session_token();
        let issued_at = Utc::now() - Duration::hours(1) - Duration::seconds(1);
        stores
            .sessions
            .create(Session::issue(
                SessionKey::new(SECRET).unwrap().digest(&token),
                user_id,
                issued_at,
                Duration::hours(1),
            ))
            .await
            .unwrap();

        assert!(manager.resolve(&token).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_current_user_rejects_anonymous() {
        let stores = Stores::in_memory();
        let mut app = app(manager(&stores));

        let response = app.call(request("/private", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_revoke_ends_session() {
        let stores = Stores::in_memory();
        let manager = manager(&stores);
        let user_id = seed_user(&stores).await;
        let issued = manager.issue(user_id).await.unwrap();

        assert!(manager.revoke(&issued.token).await.unwrap());
        assert!(manager.resolve(&issued.token).await.unwrap().is_none());
        assert!(!manager.revoke(&issued.token).await.unwrap());
    }

    #[test]
    fn test_session_cookie_attributes() {
        let stores = Stores::in_memory();
        let manager = SessionManager::new(
            stores.sessions.clone(),
            stores.users.clone(),
            SessionKey::new(SECRET).unwrap(),
            SessionSettings {
                secure: true,
                ..Default::default()
            },
        );

        let cookie = manager.session_cookie("abc").unwrap();
        assert_eq!(
            cookie.to_str().unwrap(),
            "onboardly.sid=abc; Path=/; Max-Age=3600; SameSite=Lax; HttpOnly; Secure"
        );
    }

    #[test]
    fn test_auth_error_status_codes() {
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::InvalidCredentials.code(), "invalid_credentials");
        assert_eq!(
            AuthError::Store(StoreError::Unavailable("pool timed out".into())).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AuthError::Store(StoreError::Database("boom".into())).public_message(),
            "Internal server error"
        );
    }
}
