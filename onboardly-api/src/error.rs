/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Errors are turned into the shared
/// envelope with a stable machine code:
///
/// ```json
/// { "success": false, "error": { "code": "validation_error", "message": "...", "details": [...] } }
/// ```
///
/// | Variant              | Status | Code                  |
/// |----------------------|--------|-----------------------|
/// | `BadRequest`         | 400    | `bad_request`         |
/// | `Unauthenticated`    | 401    | `unauthenticated`     |
/// | `InvalidCredentials` | 401    | `invalid_credentials` |
/// | `Forbidden`          | 403    | `forbidden`           |
/// | `NotFound`           | 404    | `not_found`           |
/// | `Conflict`           | 409    | `conflict`            |
/// | `ValidationError`    | 422    | `validation_error`    |
/// | `InternalError`      | 500    | `internal_error`      |
/// | `ServiceUnavailable` | 503    | `service_unavailable` |

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use onboardly_shared::auth::authorization::AuthzError;
use onboardly_shared::auth::middleware::AuthError;
use onboardly_shared::auth::password::PasswordError;
use onboardly_shared::envelope::{Envelope, ErrorBody, FieldError};
use onboardly_shared::store::StoreError;
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request (400)
    BadRequest(String),

    /// No session (401)
    Unauthenticated(String),

    /// Login failed (401); the message never says which part was wrong
    InvalidCredentials,

    /// Role or company refusal (403)
    Forbidden(String),

    /// Missing record (404)
    NotFound(String),

    /// Conflict (409), e.g. duplicate email
    Conflict(String),

    /// Field validation failed (422)
    ValidationError(Vec<FieldError>),

    /// Internal server error (500); the message is logged, not sent
    InternalError(String),

    /// Store unreachable or pool exhausted (503)
    ServiceUnavailable(String),
}

/// Message sent with every failed login
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect email or password.";

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::InvalidCredentials => "invalid_credentials",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict(_) => "conflict",
            ApiError::ValidationError(_) => "validation_error",
            ApiError::InternalError(_) => "internal_error",
            ApiError::ServiceUnavailable(_) => "service_unavailable",
        }
    }

    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    fn into_body(self) -> ErrorBody {
        let code = self.code();
        match self {
            ApiError::ValidationError(details) => ErrorBody {
                code: code.to_string(),
                message: "Request validation failed".to_string(),
                details: Some(details),
            },
            ApiError::InvalidCredentials => ErrorBody::new(code, INVALID_CREDENTIALS_MESSAGE),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                ErrorBody::new(code, "An internal error occurred")
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!("Service unavailable: {}", msg);
                ErrorBody::new(code, "Service temporarily unavailable")
            }
            ApiError::BadRequest(msg)
            | ApiError::Unauthenticated(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::Conflict(msg) => ErrorBody::new(code, msg),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            ApiError::InvalidCredentials => write!(f, "Invalid credentials"),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::ServiceUnavailable(msg) => write!(f, "Service unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Envelope::<()>::failure(self.into_body());

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::Conflict("Email already exists".to_string()),
            StoreError::Unavailable(msg) => ApiError::ServiceUnavailable(msg),
            StoreError::Corrupt(msg) => ApiError::InternalError(format!("Corrupt record: {}", msg)),
            StoreError::Database(msg) => ApiError::InternalError(format!("Database error: {}", msg)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Unauthenticated => ApiError::Unauthenticated(err.to_string()),
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Store(store) => store.into(),
            AuthError::Password(password) => password.into(),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::WrongCompany => ApiError::NotFound("Record not found".to_string()),
            AuthzError::NoCompany => ApiError::Forbidden(err.to_string()),
            AuthzError::InsufficientRole { .. } => {
                ApiError::Forbidden("Insufficient permissions".to_string())
            }
            AuthzError::NotAuthorized => ApiError::Forbidden(err.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", error.code)),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => ApiError::ValidationError(vec![FieldError {
                field: "body".to_string(),
                message: err.body_text(),
            }]),
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}
