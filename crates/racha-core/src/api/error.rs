use reqwest::{Response, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use crate::auth::SessionError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-2xx status. `message` is what the
    /// backend said, or the operation's fallback text.
    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Invalid response: {0}")]
    Decode(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl ApiError {
    pub fn from_status(status: StatusCode, message: String) -> Self {
        match status.as_u16() {
            401 => ApiError::Unauthorized { message },
            _ => ApiError::Rejected { status, message },
        }
    }

    /// HTTP status, when the backend answered
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Rejected { status, .. } => Some(*status),
            ApiError::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            ApiError::Network(e) => e.status(),
            _ => None,
        }
    }

    /// True when the session should be treated as dead
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized { .. })
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Pull a human-readable message out of an error response body.
///
/// Returns `message`, else `error`, else `None`; a body that is not JSON (or
/// cannot be read) is `None` too, leaving the caller to pick a fallback.
pub async fn safe_error_message(response: Response) -> Option<String> {
    let body = response.bytes().await.ok()?;
    error_message_from_body(&body)
}

pub(crate) fn error_message_from_body(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed.message.or(parsed.error)
}
