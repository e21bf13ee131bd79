//! FAQ model

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::resource::{Collection, Resource};

/// Frequently asked question shown to new hires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Faq {
    #[validate(length(min = 1, max = 500, message = "Question must be 1-500 characters"))]
    pub question: String,

    #[validate(length(min = 1, max = 5000, message = "Answer must be 1-5000 characters"))]
    pub answer: String,
}

/// Partial update of a FAQ
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct FaqPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 500, message = "Question must be 1-500 characters"))]
    pub question: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 5000, message = "Answer must be 1-5000 characters"))]
    pub answer: Option<String>,
}

impl Resource for Faq {
    const COLLECTION: Collection = Collection::Faqs;
    type Patch = FaqPatch;
}
