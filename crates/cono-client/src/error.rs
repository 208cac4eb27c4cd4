//! Client error types

use reqwest::StatusCode;
use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, ClientError>;

/// Maximum length for response bodies carried in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Token could not be obtained; nothing was sent to the storage service
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// HTTP transport error, surfaced as-is
    #[error("HTTP error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upload source could not be opened or read
    #[error("Cannot read upload source: {0}")]
    Sniff(#[source] std::io::Error),

    /// A caller-supplied header name or value is not valid HTTP
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Non-success storage response, produced only by `Response::error_for_status`
    #[error("Storage service returned {status}: {body}")]
    Status { status: StatusCode, body: String },
}

/// Failures while exchanging credentials for a token
#[derive(Error, Debug)]
pub enum AuthError {
    /// The auth endpoint could not be reached
    #[error("auth endpoint unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    /// The auth endpoint answered with a non-2xx status
    #[error("auth endpoint returned {status}: {body}")]
    Rejected { status: StatusCode, body: String },

    /// The response body is not JSON or lacks `access.token`
    #[error("invalid auth response: {0}")]
    InvalidResponse(String),
}

impl ClientError {
    /// Check if this error happened while authenticating
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    /// Check if the storage service or auth endpoint rejected the request as unauthorized
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Self::Auth(AuthError::Rejected { status, .. }) | Self::Status { status, .. } => {
                *status == StatusCode::UNAUTHORIZED
            }
            _ => false,
        }
    }

    pub(crate) fn status(status: StatusCode, body: &str) -> Self {
        Self::Status {
            status,
            body: truncate_body(body),
        }
    }
}

impl AuthError {
    pub(crate) fn rejected(status: StatusCode, body: &str) -> Self {
        Self::Rejected {
            status,
            body: truncate_body(body),
        }
    }
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}
