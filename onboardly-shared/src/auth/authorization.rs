/// Authorization checks for company-scoped resources
///
/// Every check works on the [`AuthenticatedUser`] produced by the session
/// layer, so no store round trip is needed.
///
/// # Role Hierarchy
///
/// | Permission | Minimum role | Used for                         |
/// |------------|--------------|----------------------------------|
/// | Read       | Employee     | listing and reading              |
/// | Write      | Manager      | creating, updating, deleting     |
/// | Manage     | Admin        | company settings, other users    |
///
/// Records of another company are reported as missing, not forbidden, so a
/// caller can't probe for ids outside their company.

use uuid::Uuid;

use super::middleware::AuthenticatedUser;
use crate::models::user::UserRole;

/// Authorization errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthzError {
    /// The user doesn't belong to any company yet
    #[error("You must belong to a company to do this")]
    NoCompany,

    /// The record belongs to another company
    #[error("Record belongs to another company")]
    WrongCompany,

    #[error("Insufficient permissions: requires {required:?}, has {actual:?}")]
    InsufficientRole { required: UserRole, actual: UserRole },

    #[error("Not authorized to access this resource")]
    NotAuthorized,
}

/// Permission levels for resources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourcePermission {
    Read,
    Write,
    Manage,
}

impl ResourcePermission {
    pub fn min_role(&self) -> UserRole {
        match self {
            ResourcePermission::Read => UserRole::Employee,
            ResourcePermission::Write => UserRole::Manager,
            ResourcePermission::Manage => UserRole::Admin,
        }
    }
}

/// Returns the caller's company id
pub fn require_company(user: &AuthenticatedUser) -> Result<Uuid, AuthzError> {
    user.company_id().ok_or(AuthzError::NoCompany)
}

pub fn require_role(user: &AuthenticatedUser, required: UserRole) -> Result<(), AuthzError> {
    let actual = user.role();
    if !actual.has_permission(&required) {
        return Err(AuthzError::InsufficientRole { required, actual });
    }

    Ok(())
}

/// Company membership plus the role `permission` needs; returns the company id
pub fn require_permission(
    user: &AuthenticatedUser,
    permission: ResourcePermission,
) -> Result<Uuid, AuthzError> {
    let company_id = require_company(user)?;
    require_role(user, permission.min_role())?;

    Ok(company_id)
}

/// Checks that a record owned by `owner_company_id` is visible to the caller
pub fn require_same_company(
    user: &AuthenticatedUser,
    owner_company_id: Uuid,
) -> Result<(), AuthzError> {
    match user.company_id() {
        Some(company_id) if company_id == owner_company_id => Ok(()),
        _ => Err(AuthzError::WrongCompany),
    }
}

/// Users may edit themselves; admins may edit anyone in their company
pub fn require_self_or_admin(
    user: &AuthenticatedUser,
    target_id: Uuid,
    target_company_id: Option<Uuid>,
) -> Result<(), AuthzError> {
    if user.id() == target_id {
        return Ok(());
    }

    match target_company_id {
        Some(company_id) => require_same_company(user, company_id)?,
        None => return Err(AuthzError::WrongCompany),
    }
    require_role(user, UserRole::Admin).map_err(|_| AuthzError::NotAuthorized)
}
