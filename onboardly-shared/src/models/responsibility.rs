//! Responsibility model

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::resource::{Collection, Resource};

/// Duty attached to a job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Responsibility {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    /// Job this responsibility belongs to
    pub job_id: Option<Uuid>,
}

/// Partial update of a responsibility
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResponsibilityPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,
}

impl Resource for Responsibility {
    const COLLECTION: Collection = Collection::Responsibilities;
    type Patch = ResponsibilityPatch;
}
