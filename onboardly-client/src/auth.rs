/// Client-side authentication context
///
/// Mirrors what the server thinks of the current session. Forms call
/// [`AuthContext::login`] after a successful login or registration; pages
/// read [`AuthContext::is_logged_in`] to decide where to route.

use onboardly_shared::models::user::PublicUser;

use crate::api::AuthApi;
use crate::error::ClientResult;

#[derive(Debug, Clone, Default)]
pub struct AuthContext {
    user: Option<PublicUser>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the server who the session belongs to
    pub async fn restore<A: AuthApi + ?Sized>(api: &A) -> ClientResult<Self> {
        Ok(Self {
            user: api.current_user().await?,
        })
    }

    pub fn login(&mut self, user: PublicUser) {
        tracing::debug!(user_id = %user.id, "Auth context logged in");
        self.user = Some(user);
    }

    pub fn logout(&mut self) {
        self.user = None;
    }

    /// Ends the server session, then forgets the user
    pub async fn sign_out<A: AuthApi + ?Sized>(&mut self, api: &A) -> ClientResult<()> {
        api.logout().await?;
        self.logout();
        Ok(())
    }

    pub fn is_logged_in(&self) -> bool {
        self.user.is_some()
    }

    pub fn user(&self) -> Option<&PublicUser> {
        self.user.as_ref()
    }
}
