//! Task model
//!
//! Tasks are the checklist items of an onboarding or a project. Any member
//! of the owning company may update a task, so employees can tick off their
//! own work.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::resource::{Collection, Resource};

/// Checklist item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Task {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(default)]
    pub completed: bool,

    pub due_date: Option<NaiveDate>,

    /// Onboarding this task belongs to
    pub onboarding_id: Option<Uuid>,

    /// Project this task belongs to
    pub project_id: Option<Uuid>,

    /// User expected to complete the task
    pub assignee_id: Option<Uuid>,
}

/// Partial update of a task
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub onboarding_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee_id: Option<Uuid>,
}

impl Resource for Task {
    const COLLECTION: Collection = Collection::Tasks;
    const MEMBER_UPDATABLE: bool = true;
    type Patch = TaskPatch;
}
