/// Client error types
///
/// Transport failures, non-envelope responses, and error envelopes sent back
/// by the server are kept apart so forms can decide what to show.

/// Errors raised by [`crate::api::ApiClient`]
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The request never produced a response
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with `{success: false, error}`
    #[error("{message} ({code}, HTTP {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The body was not the envelope we expected
    #[error("Unexpected response (HTTP {status}): {reason}")]
    UnexpectedResponse { status: u16, reason: String },

    /// The base URL can't be joined with an API path
    #[error("Invalid base URL: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    /// Machine code of an error envelope, if this is one
    pub fn code(&self) -> Option<&str> {
        match self {
            ClientError::Api { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Client result type alias
pub type ClientResult<T> = Result<T, ClientError>;
