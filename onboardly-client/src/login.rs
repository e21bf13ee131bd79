/// Login form state machine
///
/// ```text
///            submit (valid, not in flight)
///   Idle ──────────────────────────────> Submitting
///    ^                                    │      │
///    │ dismiss              LoggedIn      │      │ Rejected / error
///    │                   ┌────────────────┘      v
///    │             Succeeded + /profile       Failed(popup)
///    └──────────────────────────────────────────┘
/// ```
///
/// A user who is already logged in is sent to `/profile` without seeing
/// the form.

use crate::api::{AuthApi, LoginOutcome};
use crate::auth::AuthContext;
use crate::error::ClientResult;
use crate::form::{ErrorPopup, FormState, SubmitState};
use crate::validator::Validator;

pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";

/// Route shown after a successful login
pub const PROFILE_ROUTE: &str = "/profile";

pub const LOGIN_FAILED_TITLE: &str = "Login failed";
pub const LOGIN_FAILED_MESSAGE: &str = "Incorrect email or password.";

/// Shown when the server could not be reached or answered unexpectedly
pub const LOGIN_UNAVAILABLE_MESSAGE: &str = "Could not reach the server. Please try again.";

/// Credentials captured when a submission starts
#[derive(Clone, PartialEq, Eq)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LoginForm {
    form: FormState,
    state: SubmitState,
    redirect: Option<&'static str>,
}

impl Default for LoginForm {
    fn default() -> Self {
        Self::new()
    }
}

impl LoginForm {
    pub fn new() -> Self {
        Self {
            form: FormState::new()
                .with_field(EMAIL_FIELD, vec![Validator::Email])
                .with_field(PASSWORD_FIELD, vec![Validator::MinLength(6)]),
            state: SubmitState::Idle,
            redirect: None,
        }
    }

    /// Redirects straight to the profile if a session already exists
    pub fn on_mount(&mut self, auth: &AuthContext) {
        if auth.is_logged_in() {
            self.redirect = Some(PROFILE_ROUTE);
        }
    }

    pub fn input(&mut self, id: &str, value: impl Into<String>) -> Option<bool> {
        self.form.input(id, value)
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn state(&self) -> &SubmitState {
        &self.state
    }

    /// Route the page should navigate to, once decided
    pub fn redirect(&self) -> Option<&'static str> {
        self.redirect
    }

    /// Whether the submit button is enabled
    pub fn can_submit(&self) -> bool {
        self.form.is_valid() && !self.state.is_submitting()
    }

    /// Moves to `Submitting` and returns the credentials to send, or None if
    /// submission is currently blocked
    pub fn begin_submit(&mut self) -> Option<LoginRequest> {
        if !self.can_submit() {
            return None;
        }

        self.state = SubmitState::Submitting;
        Some(LoginRequest {
            email: self.form.value(EMAIL_FIELD).trim().to_string(),
            password: self.form.value(PASSWORD_FIELD).to_string(),
        })
    }

    /// Applies the server's answer to a submission started with
    /// [`LoginForm::begin_submit`]
    pub fn finish_submit(&mut self, result: ClientResult<LoginOutcome>, auth: &mut AuthContext) {
        if !self.state.is_submitting() {
            return;
        }

        self.state = match result {
            Ok(LoginOutcome::LoggedIn(user)) => {
                auth.login(user);
                self.redirect = Some(PROFILE_ROUTE);
                SubmitState::Succeeded
            }
            Ok(LoginOutcome::Rejected(_)) => SubmitState::Failed(popup(LOGIN_FAILED_MESSAGE)),
            Err(e) => {
                tracing::warn!(error = %e, "Login request failed");
                SubmitState::Failed(popup(LOGIN_UNAVAILABLE_MESSAGE))
            }
        };
    }

    /// Runs a whole submission; returns false if it was blocked
    pub async fn submit<A: AuthApi + ?Sized>(&mut self, api: &A, auth: &mut AuthContext) -> bool {
        let Some(request) = self.begin_submit() else {
            return false;
        };

        let result = api.login(&request.email, &request.password).await;
        self.finish_submit(result, auth);
        true
    }

    /// Closes the error popup
    pub fn dismiss_error(&mut self) {
        if self.state.popup().is_some() {
            self.state = SubmitState::Idle;
        }
    }
}

fn popup(message: &str) -> ErrorPopup {
    ErrorPopup {
        title: LOGIN_FAILED_TITLE.to_string(),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Registration;
    use crate::error::ClientError;
    use async_trait::async_trait;
    use chrono::Utc;
    use onboardly_shared::models::user::{PublicUser, UserRole};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    fn user() -> PublicUser {
        let now = Utc::now();
        PublicUser {
            id: Uuid::new_v4(),
            email: "a@b.com".to_string(),
            name: None,
            role: UserRole::Employee,
            company_id: None,
            created_at: now,
            updated_at: now,
            last_login_at: Some(now),
        }
    }

    /// Accepts a@b.com / secret1 and counts calls
    #[derive(Default)]
    struct FakeApi {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AuthApi for FakeApi {
        async fn login(&self, email: &str, password: &str) -> ClientResult<LoginOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if email == "a@b.com" && password == "secret1" {
                Ok(LoginOutcome::LoggedIn(user()))
            } else {
                Ok(LoginOutcome::Rejected(LOGIN_FAILED_MESSAGE.to_string()))
            }
        }

        async fn register(&self, _registration: &Registration) -> ClientResult<PublicUser> {
            Ok(user())
        }

        async fn logout(&self) -> ClientResult<()> {
            Ok(())
        }

        async fn current_user(&self) -> ClientResult<Option<PublicUser>> {
            Ok(None)
        }
    }

    fn filled(email: &str, password: &str) -> LoginForm {
        let mut form = LoginForm::new();
        form.input(EMAIL_FIELD, email);
        form.input(PASSWORD_FIELD, password);
        form
    }

    #[test]
    fn test_invalid_input_keeps_submit_disabled() {
        assert!(!LoginForm::new().can_submit());
        assert!(!filled("not-an-email", "secret1").can_submit());
        assert!(!filled("a@b.com", "12345").can_submit());
        assert!(filled("a@b.com", "123456").can_submit());
    }

    #[tokio::test]
    async fn test_blocked_submit_never_calls_the_server() {
        let api = FakeApi::default();
        let mut auth = AuthContext::new();
        let mut form = filled("a@b.com", "short");

        assert!(!form.submit(&api, &mut auth).await);
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
        assert_eq!(form.state(), &SubmitState::Idle);
    }

    #[test]
    fn test_no_second_submit_while_in_flight() {
        let mut form = filled("a@b.com", "secret1");

        let request = form.begin_submit().unwrap();
        assert_eq!(request.email, "a@b.com");
        assert!(form.state().is_submitting());
        assert!(!form.can_submit());
        assert!(form.begin_submit().is_none());
    }

    #[tokio::test]
    async fn test_success_logs_in_and_redirects() {
        let api = FakeApi::default();
        let mut auth = AuthContext::new();
        let mut form = filled("a@b.com", "secret1");

        assert!(form.submit(&api, &mut auth).await);

        assert_eq!(form.state(), &SubmitState::Succeeded);
        assert_eq!(form.redirect(), Some(PROFILE_ROUTE));
        assert!(auth.is_logged_in());
        assert_eq!(auth.user().unwrap().email, "a@b.com");
    }

    #[tokio::test]
    async fn test_rejection_shows_popup_until_dismissed() {
        let api = FakeApi::default();
        let mut auth = AuthContext::new();
        let mut form = filled("a@b.com", "wrong-password");

        form.submit(&api, &mut auth).await;

        let popup = form.state().popup().unwrap();
        assert_eq!(popup.title, "Login failed");
        assert_eq!(popup.message, "Incorrect email or password.");
        assert!(!auth.is_logged_in());
        assert_eq!(form.redirect(), None);

        form.dismiss_error();
        assert_eq!(form.state(), &SubmitState::Idle);
        assert!(form.can_submit());
    }

    #[test]
    fn test_transport_error_is_a_failure() {
        let mut auth = AuthContext::new();
        let mut form = filled("a@b.com", "secret1");
        form.begin_submit();

        form.finish_submit(
            Err(ClientError::UnexpectedResponse {
                status: 502,
                reason: "bad gateway".to_string(),
            }),
            &mut auth,
        );

        assert_eq!(
            form.state().popup().map(|p| p.message.as_str()),
            Some(LOGIN_UNAVAILABLE_MESSAGE)
        );
    }

    #[test]
    fn test_logged_in_user_is_redirected_on_mount() {
        let mut auth = AuthContext::new();
        auth.login(user());

        let mut form = LoginForm::new();
        form.on_mount(&auth);
        assert_eq!(form.redirect(), Some(PROFILE_ROUTE));

        let mut anonymous = LoginForm::new();
        anonymous.on_mount(&AuthContext::new());
        assert_eq!(anonymous.redirect(), None);
    }
}
