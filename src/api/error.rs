//! Gateway Errors
//!
//! Every failing backend call is normalized into one of these kinds; callers
//! decide how to present it.

use thiserror::Error;

/// Normalized error produced by the API gateway
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// The backend could not be reached
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success HTTP status
    #[error("API Error: {status}")]
    RequestFailed { status: u16 },

    /// Success status but the body is not a well-formed envelope
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// The request could not be built (bad path or unserializable body)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status carried by the error, if the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::RequestFailed { status } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}
