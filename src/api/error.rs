//! Errors surfaced by backend calls

use thiserror::Error;

/// Failure of a single backend or object-storage call.
///
/// Every variant is caught at the call site: background flows log and
/// swallow it, user-initiated flows turn it into a transient notice.
#[derive(Debug, Error)]
pub enum ApiError {
    /// No access token was available, so no request was sent
    #[error("Missing access token")]
    MissingToken,

    /// The backend answered with a non-success status
    #[error("API error {status} on {path}")]
    Status { status: u16, path: String },

    /// The direct PUT to the pre-signed upload URL was rejected
    #[error("Upload rejected with status {status}")]
    Upload { status: u16 },

    /// Connection, timeout or body decoding failure
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    /// HTTP status code, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::Upload { status } => Some(*status),
            ApiError::MissingToken => None,
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
