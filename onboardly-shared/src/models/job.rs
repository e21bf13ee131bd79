//! Job model

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::resource::{Collection, Resource};

/// Position a company hires and onboards for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Job {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 255, message = "Department must be at most 255 characters"))]
    pub department: Option<String>,
}

/// Partial update of a job
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct JobPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 255, message = "Department must be at most 255 characters"))]
    pub department: Option<String>,
}

impl Resource for Job {
    const COLLECTION: Collection = Collection::Jobs;
    type Patch = JobPatch;
}
