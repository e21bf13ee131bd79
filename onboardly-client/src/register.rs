/// Company account registration form
///
/// Same lifecycle as [`crate::login::LoginForm`]. A successful registration
/// starts a session on the server, so the context is logged in and the page
/// moves on to the profile.

use crate::api::{AuthApi, Registration};
use crate::auth::AuthContext;
use crate::error::{ClientError, ClientResult};
use crate::form::{ErrorPopup, FormState, SubmitState};
use crate::login::PROFILE_ROUTE;
use crate::validator::Validator;
use onboardly_shared::models::user::PublicUser;

pub const EMAIL_FIELD: &str = "email";
pub const PASSWORD_FIELD: &str = "password";
pub const NAME_FIELD: &str = "name";
pub const COMPANY_NAME_FIELD: &str = "company_name";

pub const REGISTER_FAILED_TITLE: &str = "Registration failed";

#[derive(Debug, Clone)]
pub struct RegisterForm {
    form: FormState,
    state: SubmitState,
    redirect: Option<&'static str>,
}

impl Default for RegisterForm {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterForm {
    pub fn new() -> Self {
        Self {
            form: FormState::new()
                .with_field(EMAIL_FIELD, vec![Validator::Email])
                .with_field(
                    PASSWORD_FIELD,
                    vec![Validator::MinLength(6), Validator::MaxLength(128)],
                )
                .with_field(NAME_FIELD, vec![Validator::MaxLength(255)])
                .with_field(
                    COMPANY_NAME_FIELD,
                    vec![Validator::Require, Validator::MaxLength(255)],
                ),
            state: SubmitState::Idle,
            redirect: None,
        }
    }

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

    pub fn redirect(&self) -> Option<&'static str> {
        self.redirect
    }

    pub fn can_submit(&self) -> bool {
        self.form.is_valid() && !self.state.is_submitting()
    }

    pub fn begin_submit(&mut self) -> Option<Registration> {
        if !self.can_submit() {
            return None;
        }

        self.state = SubmitState::Submitting;
        let name = self.form.value(NAME_FIELD).trim();
        Some(Registration {
            email: self.form.value(EMAIL_FIELD).trim().to_string(),
            password: self.form.value(PASSWORD_FIELD).to_string(),
            name: (!name.is_empty()).then(|| name.to_string()),
            company_name: Some(self.form.value(COMPANY_NAME_FIELD).trim().to_string()),
        })
    }

    pub fn finish_submit(&mut self, result: ClientResult<PublicUser>, auth: &mut AuthContext) {
        if !self.state.is_submitting() {
            return;
        }

        self.state = match result {
            Ok(user) => {
                auth.login(user);
                self.redirect = Some(PROFILE_ROUTE);
                SubmitState::Succeeded
            }
            // The server's messages for these are meant for end users
            Err(ClientError::Api { code, message, .. })
                if code == "conflict" || code == "validation_error" =>
            {
                SubmitState::Failed(popup(message))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Registration request failed");
                SubmitState::Failed(popup("Could not create the account. Please try again."))
            }
        };
    }

    pub async fn submit<A: AuthApi + ?Sized>(&mut self, api: &A, auth: &mut AuthContext) -> bool {
        let Some(registration) = self.begin_submit() else {
            return false;
        };

        let result = api.register(&registration).await;
        self.finish_submit(result, auth);
        true
    }

    pub fn dismiss_error(&mut self) {
        if self.state.popup().is_some() {
            self.state = SubmitState::Idle;
        }
    }
}

fn popup(message: impl Into<String>) -> ErrorPopup {
    ErrorPopup {
        title: REGISTER_FAILED_TITLE.to_string(),
        message: message.into(),
    }
}
