//! Error types for radar-api

use thiserror::Error;

/// radar-api error type
///
/// Non-2xx responses are classified here once, at the API boundary; callers
/// only ever see this taxonomy, never a raw HTTP failure.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not authenticated (missing or expired token)")]
    Unauthenticated,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found")]
    NotFound,

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(String),
}

impl ApiError {
    /// Whether this failure means the session is missing or expired
    pub fn is_auth(&self) -> bool {
        matches!(self, ApiError::Unauthenticated)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Http(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ApiError>;
