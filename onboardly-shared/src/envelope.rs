//! Response envelope shared by the API server and its clients
//!
//! Every route answers with the same JSON shape:
//!
//! ```json
//! { "success": true, "data": { "id": "..." } }
//! { "success": false, "error": { "code": "not_found", "message": "Job not found" } }
//! ```
//!
//! Login is the one exception kept for front-end compatibility: the user is
//! returned under `foundUser` instead of `data`.

use serde::{Deserialize, Serialize};

use crate::models::user::PublicUser;

/// A single field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Human-readable reason
    pub message: String,
}

/// Error half of the envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Stable machine-readable code (e.g. `validation_error`, `not_found`)
    pub code: String,

    /// Human-readable message
    pub message: String,

    /// Per-field validation failures, when the code is `validation_error`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<FieldError>>,
}

impl ErrorBody {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }
}

/// `{success, data|error}` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl<T> Envelope<T> {
    /// Successful envelope carrying `data`
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Failed envelope carrying `error`
    pub fn failure(error: ErrorBody) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

/// Body of `POST /api/users/login`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginEnvelope {
    pub success: bool,

    #[serde(
        rename = "foundUser",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub found_user: Option<PublicUser>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl LoginEnvelope {
    pub fn found(user: PublicUser) -> Self {
        Self {
            success: true,
            found_user: Some(user),
            error: None,
        }
    }
}
