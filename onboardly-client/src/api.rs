/// Typed HTTP client for the Onboardly API
///
/// [`AuthApi`] is the seam the forms talk through; [`ApiClient`] implements
/// it over `reqwest` with a cookie store, so the session cookie issued at
/// login rides along on every later call.
///
/// # Example
///
/// ```no_run
/// use onboardly_client::api::{ApiClient, AuthApi, LoginOutcome};
///
/// # async fn example() -> Result<(), onboardly_client::error::ClientError> {
/// let client = ApiClient::new("http://127.0.0.1:3001")?;
/// match client.login("a@b.com", "secret1").await? {
///     LoginOutcome::LoggedIn(user) => println!("Hello {}", user.email),
///     LoginOutcome::Rejected(message) => println!("{}", message),
/// }
/// # Ok(())
/// # }
/// ```

use std::time::Duration;

use async_trait::async_trait;
use onboardly_shared::envelope::{Envelope, LoginEnvelope};
use onboardly_shared::models::user::PublicUser;
use reqwest::{Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{ClientError, ClientResult};

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Result of a login attempt that reached the server
#[derive(Debug, Clone, PartialEq)]
pub enum LoginOutcome {
    LoggedIn(PublicUser),

    /// Credentials were refused; carries the server's message
    Rejected(String),
}

/// Registration form payload
#[derive(Debug, Clone, Default, Serialize)]
pub struct Registration {
    pub email: String,
    pub password: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    email: &'a str,
    password: &'a str,
}

/// Account operations used by the forms
#[async_trait]
pub trait AuthApi: Send + Sync {
    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginOutcome>;

    async fn register(&self, registration: &Registration) -> ClientResult<PublicUser>;

    async fn logout(&self) -> ClientResult<()>;

    /// The user behind the current session, if any
    async fn current_user(&self) -> ClientResult<Option<PublicUser>>;
}

/// `reqwest`-backed [`AuthApi`]
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:3001`)
    pub fn new(base_url: impl Into<String>) -> ClientResult<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(base_url));
        }

        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(DEFAULT_TIMEOUT)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl AuthApi for ApiClient {
    async fn login(&self, email: &str, password: &str) -> ClientResult<LoginOutcome> {
        let response = self
            .http
            .post(self.url("/api/users/login"))
            .json(&LoginBody { email, password })
            .send()
            .await?;

        let status = response.status();
        let body: LoginEnvelope = parse(response).await?;

        match (body.success, body.found_user, body.error) {
            (true, Some(user), _) => {
                tracing::debug!(user_id = %user.id, "Logged in");
                Ok(LoginOutcome::LoggedIn(user))
            }
            (_, _, Some(error))
                if status == StatusCode::UNAUTHORIZED
                    || status == StatusCode::UNPROCESSABLE_ENTITY =>
            {
                tracing::debug!(code = %error.code, "Login rejected");
                Ok(LoginOutcome::Rejected(error.message))
            }
            (_, _, Some(error)) => Err(ClientError::Api {
                status: status.as_u16(),
                code: error.code,
                message: error.message,
            }),
            _ => Err(ClientError::UnexpectedResponse {
                status: status.as_u16(),
                reason: "login response carried neither a user nor an error".to_string(),
            }),
        }
    }

    async fn register(&self, registration: &Registration) -> ClientResult<PublicUser> {
        let response = self
            .http
            .post(self.url("/api/users/register"))
            .json(registration)
            .send()
            .await?;

        let status = response.status();
        data(response).await?.ok_or(ClientError::UnexpectedResponse {
            status: status.as_u16(),
            reason: "registration returned no user".to_string(),
        })
    }

    async fn logout(&self) -> ClientResult<()> {
        let response = self.http.post(self.url("/api/users/logout")).send().await?;
        data::<serde_json::Value>(response).await?;

        Ok(())
    }

    async fn current_user(&self) -> ClientResult<Option<PublicUser>> {
        let response = self.http.get(self.url("/api/users/current")).send().await?;

        data(response).await
    }
}

async fn parse<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status().as_u16();
    let bytes = response.bytes().await?;

    serde_json::from_slice(&bytes).map_err(|e| ClientError::UnexpectedResponse {
        status,
        reason: e.to_string(),
    })
}

/// Unwraps `{success, data|error}`; `Ok(None)` for a successful `data: null`
async fn data<T: DeserializeOwned>(response: Response) -> ClientResult<Option<T>> {
    let status = response.status().as_u16();
    let envelope: Envelope<T> = parse(response).await?;

    if envelope.success {
        return Ok(envelope.data);
    }

    match envelope.error {
        Some(error) => Err(ClientError::Api {
            status,
            code: error.code,
            message: error.message,
        }),
        None => Err(ClientError::UnexpectedResponse {
            status,
            reason: "failed envelope without an error".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_trims_trailing_slash() {
        let client = ApiClient::new("http://127.0.0.1:3001/").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:3001");
        assert_eq!(client.url("/api/users/login"), "http://127.0.0.1:3001/api/users/login");
    }

    #[test]
    fn test_new_rejects_non_http_url() {
        assert!(matches!(
            ApiClient::new("127.0.0.1:3001"),
            Err(ClientError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_registration_omits_absent_fields() {
        let value = serde_json::to_value(Registration {
            email: "a@b.com".to_string(),
            password: "secret1".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(value, serde_json::json!({"email": "a@b.com", "password": "secret1"}));
    }
}
