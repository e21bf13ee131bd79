//! Generic CRUD handlers for company-owned documents
//!
//! One router per [`Resource`] type:
//!
//! | Method | Path   | Permission                                  |
//! |--------|--------|---------------------------------------------|
//! | POST   | `/`    | manager                                     |
//! | GET    | `/`    | any member                                  |
//! | GET    | `/:id` | any member                                  |
//! | PUT    | `/:id` | manager, or any member if `MEMBER_UPDATABLE` |
//! | DELETE | `/:id` | manager                                     |
//!
//! The record is always loaded and its company checked before the role, so
//! a caller outside the company gets `404` whatever their role.

use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use onboardly_shared::auth::authorization::{
    require_permission, require_role, require_same_company, AuthzError, ResourcePermission,
};
use onboardly_shared::auth::middleware::{AuthenticatedUser, CurrentUser};
use onboardly_shared::envelope::Envelope;
use onboardly_shared::models::company::Company;
use onboardly_shared::models::resource::{Record, Resource};
use onboardly_shared::store::repository::Repository;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::extract::{Pagination, RecordId, ValidatedJson};
use crate::app::AppState;
use crate::error::{ApiError, ApiResult};

/// One page of a list endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Body of a successful delete
#[derive(Debug, Serialize, Deserialize)]
pub struct Deleted {
    pub id: Uuid,
}

pub fn router<T: Resource>() -> Router<AppState> {
    Router::new()
        .route("/", post(create::<T>).get(list::<T>))
        .route("/:id", get(read::<T>).put(update::<T>).delete(remove::<T>))
}

pub(crate) fn repository<T: Resource>(state: &AppState) -> Repository<T> {
    Repository::new(state.stores.documents.clone())
}

pub(crate) fn not_found<T: Resource>() -> ApiError {
    ApiError::NotFound(format!("{} not found", T::COLLECTION.label()))
}

/// Loads a record the caller's company owns, or reports it missing
pub(crate) async fn load<T: Resource>(
    repo: &Repository<T>,
    user: &AuthenticatedUser,
    id: Uuid,
) -> ApiResult<Record<T>> {
    let record = repo.get(id).await?.ok_or_else(not_found::<T>)?;
    require_same_company(user, record.company_id).map_err(|_| not_found::<T>())?;

    Ok(record)
}

async fn create<T: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ValidatedJson(body): ValidatedJson<T>,
) -> ApiResult<(StatusCode, Json<Envelope<Record<T>>>)> {
    let company_id = require_permission(&user, ResourcePermission::Write)?;

    // No new documents under a company that has been deleted
    if repository::<Company>(&state).get(company_id).await?.is_none() {
        return Err(AuthzError::NoCompany.into());
    }

    let record = repository::<T>(&state).create(company_id, body).await?;
    tracing::info!(
        collection = T::COLLECTION.as_str(),
        id = %record.id,
        company_id = %company_id,
        user_id = %user.id(),
        "Record created"
    );

    Ok((StatusCode::CREATED, Json(Envelope::ok(record))))
}

async fn list<T: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    page: Pagination,
) -> ApiResult<Json<Envelope<Page<Record<T>>>>> {
    let company_id = require_permission(&user, ResourcePermission::Read)?;
    let repo = repository::<T>(&state);

    let items = repo.list(company_id, page.limit, page.offset).await?;
    let total = repo.count(company_id).await?;

    Ok(Json(Envelope::ok(Page {
        items,
        total,
        limit: page.limit,
        offset: page.offset,
    })))
}

async fn read<T: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecordId(id): RecordId,
) -> ApiResult<Json<Envelope<Record<T>>>> {
    let record = load(&repository::<T>(&state), &user, id).await?;

    Ok(Json(Envelope::ok(record)))
}

async fn update<T: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecordId(id): RecordId,
    ValidatedJson(patch): ValidatedJson<T::Patch>,
) -> ApiResult<Json<Envelope<Record<T>>>> {
    let repo = repository::<T>(&state);
    load(&repo, &user, id).await?;

    let permission = if T::MEMBER_UPDATABLE {
        ResourcePermission::Read
    } else {
        ResourcePermission::Write
    };
    require_role(&user, permission.min_role())?;

    // Gone between the load and the merge means a concurrent delete
    let record = repo.update(id, &patch).await?.ok_or_else(not_found::<T>)?;
    tracing::info!(
        collection = T::COLLECTION.as_str(),
        id = %id,
        user_id = %user.id(),
        "Record updated"
    );

    Ok(Json(Envelope::ok(record)))
}

async fn remove<T: Resource>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    RecordId(id): RecordId,
) -> ApiResult<Json<Envelope<Deleted>>> {
    let repo = repository::<T>(&state);
    load(&repo, &user, id).await?;
    require_role(&user, ResourcePermission::Write.min_role())?;

    if !repo.delete(id).await? {
        return Err(not_found::<T>());
    }
    tracing::info!(
        collection = T::COLLECTION.as_str(),
        id = %id,
        user_id = %user.id(),
        "Record deleted"
    );

    Ok(Json(Envelope::ok(Deleted { id })))
}
