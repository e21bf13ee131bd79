//! User routes
//!
//! Registration, login, logout, and profile management.
//!
//! # Endpoints
//!
//! - `POST /register`: create an account and start a session
//! - `POST /login`: exchange credentials for a session cookie
//! - `POST /logout`: end the session
//! - `GET /current`: the session's user, or `null`
//! - `GET /`, `GET /:id`: users of the caller's company
//! - `PUT /:id`: edit a profile (self, or the company admin)

use axum::{
    extract::State,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::Utc;
use onboardly_shared::auth::authorization::{require_company, require_self_or_admin, AuthzError};
use onboardly_shared::auth::middleware::{AuthenticatedUser, CurrentUser, Identity};
use onboardly_shared::auth::password::{hash_password, validate_password_strength};
use onboardly_shared::auth::strategy::Credentials;
use onboardly_shared::envelope::{Envelope, LoginEnvelope};
use onboardly_shared::models::company::Company;
use onboardly_shared::models::user::{
    normalize_email, CreateUser, PublicUser, UpdateUser, User, UserRole,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::extract::{Pagination, RecordId, ValidatedJson};
use super::resources::{repository, Page};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

type CookieHeader = [(header::HeaderName, HeaderValue); 1];

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users))
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/current", get(current_user))
        .route("/:id", put(update_user).get(get_user))
}

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: String,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: String,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    /// Creates a company with the new user as its admin
    #[validate(length(min = 1, max = 255, message = "Company name must be 1-255 characters"))]
    pub company_name: Option<String>,

    /// Joins an existing company as an employee
    pub company_id: Option<Uuid>,
}

/// Profile edit; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(email(message = "Must be a valid email address"))]
    pub email: Option<String>,

    #[validate(length(min = 6, max = 128, message = "Password must be 6-128 characters"))]
    pub password: Option<String>,

    #[validate(length(max = 255, message = "Name must be at most 255 characters"))]
    pub name: Option<String>,

    /// Admins only
    pub role: Option<UserRole>,
}

/// POST /api/users/register
///
/// Starts a session for the new user, revoking any session the caller held.
async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> ApiResult<(StatusCode, CookieHeader, Json<Envelope<PublicUser>>)> {
    if req.company_name.is_some() && req.company_id.is_some() {
        return Err(ApiError::invalid_field(
            "company_id",
            "Give either company_name or company_id, not both",
        ));
    }

    if let Some(company_id) = req.company_id {
        if repository::<Company>(&state).get(company_id).await?.is_none() {
            return Err(ApiError::invalid_field("company_id", "Company does not exist"));
        }
    }

    let password_hash = hash_blocking(req.password).await?;

    let user = state
        .stores
        .users
        .create(CreateUser {
            email: req.email,
            password_hash,
            name: req.name,
            role: UserRole::Employee,
            company_id: req.company_id,
        })
        .await?;

    let user = match req.company_name {
        Some(company_name) => found_company(&state, user, company_name).await?,
        None => user,
    };

    tracing::info!(user_id = %user.id, company_id = ?user.company_id, "User registered");

    if let Some(previous) = state.sessions.token_from_headers(&headers) {
        state.sessions.revoke(&previous).await?;
    }

    let session = state.sessions.issue(user.id).await?;
    let cookie = state.sessions.session_cookie(&session.token)?;

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(Envelope::ok(user.into())),
    ))
}

/// Creates a company and makes `user` its admin
async fn found_company(state: &AppState, user: User, name: String) -> ApiResult<User> {
    let company = repository::<Company>(state)
        .create_owned(Company::named(name))
        .await?;

    let updated = state
        .stores
        .users
        .update(
            user.id,
            UpdateUser {
                role: Some(UserRole::Admin),
                company_id: Some(Some(company.id)),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| {
            tracing::error!(
                user_id = %user.id,
                company_id = %company.id,
                error = %e,
                "Company created but registrant was not attached"
            );
            ApiError::from(e)
        })?;

    updated.ok_or_else(|| ApiError::InternalError(format!("User {} vanished", user.id)))
}

/// POST /api/users/login
///
/// Success answers `{success: true, foundUser}` with a fresh session
/// cookie. Any existing session of the caller is revoked first.
async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    ValidatedJson(credentials): ValidatedJson<Credentials>,
) -> ApiResult<(CookieHeader, Json<LoginEnvelope>)> {
    let user = match state.strategy.authenticate(&credentials).await? {
        Some(user) => user,
        None => {
            tracing::info!(strategy = state.strategy.name(), "Login failed");
            return Err(ApiError::InvalidCredentials);
        }
    };

    if let Some(previous) = state.sessions.token_from_headers(&headers) {
        state.sessions.revoke(&previous).await?;
    }

    let now = Utc::now();
    state.stores.users.update_last_login(user.id, now).await?;

    let session = state.sessions.issue(user.id).await?;
    let cookie = state.sessions.session_cookie(&session.token)?;
    tracing::info!(user_id = %user.id, strategy = state.strategy.name(), "Login succeeded");

    let mut public = PublicUser::from(user);
    public.last_login_at = Some(now);

    Ok(([(header::SET_COOKIE, cookie)], Json(LoginEnvelope::found(public))))
}

/// POST /api/users/logout
///
/// Always succeeds; logging out without a session just clears the cookie.
async fn logout(
    State(state): State<AppState>,
    identity: Identity,
    headers: HeaderMap,
) -> ApiResult<(CookieHeader, Json<Envelope<serde_json::Value>>)> {
    if let Some(token) = state.sessions.token_from_headers(&headers) {
        state.sessions.revoke(&token).await?;
    }
    if let Some(user) = identity.user() {
        tracing::info!(user_id = %user.id(), "Logged out");
    }

    let cookie = state.sessions.clear_cookie()?;

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(Envelope::ok(serde_json::Value::Null)),
    ))
}

/// GET /api/users/current
async fn current_user(identity: Identity) -> Json<Envelope<Option<PublicUser>>> {
    Json(Envelope::ok(identity.user().map(|u| u.user.clone())))
}

/// GET /api/users
async fn list_users(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    page: Pagination,
) -> ApiResult<Json<Envelope<Page<PublicUser>>>> {
    let company_id = require_company(&user)?;

    let items: Vec<PublicUser> = state
        .stores
        .users
        .list_by_company(company_id, page.limit, page.offset)
        .await?
        .into_iter()
        .map(PublicUser::from)
        .collect();
    let total = state.stores.users.count_by_company(company_id).await?;

    Ok(Json(Envelope::ok(Page {
        items,
        total,
        limit: page.limit,
        offset: page.offset,
    })))
}

/// GET /api/users/:id
async fn get_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecordId(id): RecordId,
) -> ApiResult<Json<Envelope<PublicUser>>> {
    let target = load_visible(&state, &user, id).await?;

    Ok(Json(Envelope::ok(target.into())))
}

/// PUT /api/users/:id
async fn update_user(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecordId(id): RecordId,
    ValidatedJson(req): ValidatedJson<UpdateUserRequest>,
) -> ApiResult<Json<Envelope<PublicUser>>> {
    let target = load_visible(&state, &user, id).await?;

    require_self_or_admin(&user, target.id, target.company_id).map_err(|e| match e {
        AuthzError::WrongCompany => user_not_found(),
        other => other.into(),
    })?;

    if req.role.is_some() && user.role() != UserRole::Admin {
        return Err(ApiError::Forbidden("Only admins can change roles".to_string()));
    }

    if let (Some(role), Some(company_id)) = (req.role, target.company_id) {
        if target.role == UserRole::Admin && role != UserRole::Admin {
            let admins = state
                .stores
                .users
                .count_by_role(company_id, UserRole::Admin)
                .await?;
            if admins <= 1 {
                return Err(ApiError::Conflict(
                    "A company must keep at least one admin".to_string(),
                ));
            }
        }
    }

    let password_hash = match req.password {
        Some(password) => {
            validate_password_strength(&password)
                .map_err(|msg| ApiError::invalid_field("password", msg))?;
            Some(hash_blocking(password).await?)
        }
        None => None,
    };

    let changes = UpdateUser {
        email: req.email.map(|email| normalize_email(&email)),
        password_hash,
        name: req.name.map(Some),
        role: req.role,
        company_id: None,
    };

    if changes.is_empty() {
        return Ok(Json(Envelope::ok(target.into())));
    }

    let password_changed = changes.password_hash.is_some();
    let updated = state
        .stores
        .users
        .update(id, changes)
        .await?
        .ok_or_else(user_not_found)?;

    tracing::info!(user_id = %id, by = %user.id(), password_changed, "User updated");

    Ok(Json(Envelope::ok(updated.into())))
}

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".to_string())
}

/// Loads a user the caller may see: themselves, or someone in their company
async fn load_visible(state: &AppState, caller: &AuthenticatedUser, id: Uuid) -> ApiResult<User> {
    let target = state
        .stores
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(user_not_found)?;

    let same_company = caller.company_id().is_some() && caller.company_id() == target.company_id;
    if target.id != caller.id() && !same_company {
        return Err(user_not_found());
    }

    Ok(target)
}

/// Argon2 is CPU-bound; keep it off the async workers
async fn hash_blocking(password: String) -> ApiResult<String> {
    let hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| ApiError::InternalError(format!("Hashing task failed: {}", e)))??;

    Ok(hash)
}
