//! Company routes
//!
//! A company document owns itself, so the generic record checks from
//! [`super::resources`] apply unchanged. What differs is who may act:
//!
//! - `POST /` is open to any logged-in user without a company; the creator
//!   becomes the company's admin.
//! - `GET /` lists only the caller's own company.
//! - `PUT /:id` and `DELETE /:id` require the company's admin.
//!
//! Deleting a company removes its documents and detaches its members, who
//! may then found or join another company.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use onboardly_shared::auth::authorization::{require_role, ResourcePermission};
use onboardly_shared::auth::middleware::CurrentUser;
use onboardly_shared::envelope::Envelope;
use onboardly_shared::models::company::{Company, CompanyPatch};
use onboardly_shared::models::resource::Record;
use onboardly_shared::models::user::{UpdateUser, UserRole};

use super::extract::{RecordId, ValidatedJson};
use super::resources::{load, not_found, repository, Deleted, Page};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_company).get(list_companies))
        .route(
            "/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
}

async fn create_company(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(body): ValidatedJson<Company>,
) -> ApiResult<(StatusCode, Json<Envelope<Record<Company>>>)> {
    let repo = repository::<Company>(&state);

    // A membership pointing at a deleted company does not block founding a new one
    if let Some(company_id) = user.company_id() {
        if repo.get(company_id).await?.is_some() {
            return Err(ApiError::Conflict("You already belong to a company".to_string()));
        }
    }

    let company = repo.create_owned(body).await?;

    // Two separate writes: a failure here leaves an ownerless company behind
    let promoted = state
        .stores
        .users
        .update(
            user.id(),
            UpdateUser {
                role: Some(UserRole::Admin),
                company_id: Some(Some(company.id)),
                ..Default::default()
            },
        )
        .await;

    match promoted {
        Ok(Some(_)) => {}
        Ok(None) => {
            tracing::warn!(user_id = %user.id(), company_id = %company.id, "Creator vanished before promotion");
            return Err(ApiError::Unauthenticated("Authentication required".to_string()));
        }
        Err(e) => {
            tracing::error!(
                user_id = %user.id(),
                company_id = %company.id,
                error = %e,
                "Company created but creator was not attached"
            );
            return Err(e.into());
        }
    }

    tracing::info!(company_id = %company.id, user_id = %user.id(), "Company created");

    Ok((StatusCode::CREATED, Json(Envelope::ok(company))))
}

async fn list_companies(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Envelope<Page<Record<Company>>>>> {
    let items = match user.company_id() {
        Some(company_id) => repository::<Company>(&state)
            .get(company_id)
            .await?
            .into_iter()
            .collect(),
        None => Vec::new(),
    };
    let total = items.len() as i64;

    Ok(Json(Envelope::ok(Page {
        items,
        total,
        limit: 1,
        offset: 0,
    })))
}

async fn get_company(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecordId(id): RecordId,
) -> ApiResult<Json<Envelope<Record<Company>>>> {
    let company = load(&repository::<Company>(&state), &user, id).await?;

    Ok(Json(Envelope::ok(company)))
}

async fn update_company(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecordId(id): RecordId,
    ValidatedJson(patch): ValidatedJson<CompanyPatch>,
) -> ApiResult<Json<Envelope<Record<Company>>>> {
    let repo = repository::<Company>(&state);
    load(&repo, &user, id).await?;
    require_role(&user, ResourcePermission::Manage.min_role())?;

    let company = repo.update(id, &patch).await?.ok_or_else(not_found::<Company>)?;
    tracing::info!(company_id = %id, user_id = %user.id(), "Company updated");

    Ok(Json(Envelope::ok(company)))
}

/// Deletes the company and everything it owns
///
/// The company document goes first so that a failure part-way leaves
/// members pointing at a missing company, which [`create_company`] accepts.
async fn delete_company(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecordId(id): RecordId,
) -> ApiResult<Json<Envelope<Deleted>>> {
    let repo = repository::<Company>(&state);
    load(&repo, &user, id).await?;
    require_role(&user, ResourcePermission::Manage.min_role())?;

    if !repo.delete(id).await? {
        return Err(not_found::<Company>());
    }

    let detached = state.stores.users.detach_company(id).await?;
    let documents = state.stores.documents.delete_by_company(id).await?;
    tracing::info!(
        company_id = %id,
        user_id = %user.id(),
        detached,
        documents,
        "Company deleted"
    );

    Ok(Json(Envelope::ok(Deleted { id })))
}
