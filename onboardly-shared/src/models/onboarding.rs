//! Onboarding model
//!
//! An onboarding tracks one new hire's path into a job. Its checklist lives
//! in tasks that reference it through `onboarding_id`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::resource::{Collection, Resource};

/// Progress of an onboarding
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// Onboarding of a new hire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Onboarding {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    /// User being onboarded
    pub employee_id: Option<Uuid>,

    /// Job the user is onboarded into
    pub job_id: Option<Uuid>,

    pub start_date: Option<NaiveDate>,

    #[serde(default)]
    pub status: OnboardingStatus,
}

/// Partial update of an onboarding
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct OnboardingPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<Uuid>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<OnboardingStatus>,
}

impl Resource for Onboarding {
    const COLLECTION: Collection = Collection::Onboardings;
    type Patch = OnboardingPatch;
}
