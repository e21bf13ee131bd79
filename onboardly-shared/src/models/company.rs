//! Company model
//!
//! Companies are the tenant boundary: users and every other resource belong
//! to exactly one company.

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::resource::{Collection, Resource};

/// Organizational container
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Company {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
}

impl Company {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            website: None,
            logo_url: None,
        }
    }
}

/// Partial update of a company
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CompanyPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Website must be a valid URL"))]
    pub website: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
}

impl Resource for Company {
    const COLLECTION: Collection = Collection::Companies;
    type Patch = CompanyPatch;
}
