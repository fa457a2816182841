//! Failures of remote API calls.

use thiserror::Error;

use crate::types::{
    ValidationError,
    format_validation_errors,
};

/// Failures talking to the remote API, plus client-side rejections that
/// stop a request before it is sent.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, TLS, timeout or body read failure
    #[error("Network request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response carrying a server-supplied or generic message
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Response body was not JSON (typically an HTML error page from a
    /// misconfigured proxy), or JSON of the wrong shape
    #[error("Server returned an unexpected response (status {status}): {snippet}")]
    Malformed { status: u16, snippet: String },

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),

    /// An authenticated endpoint was called without a session
    #[error("You need to sign in to do that")]
    NotAuthenticated,

    #[error("Please correct the following:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),
}

impl ApiError {
    /// HTTP status attached to the error, if the server answered at all.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } | Self::Malformed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for 401/403, the signal that a stored session is no longer valid.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }

    /// True when the error was raised before any request left the client.
    #[must_use]
    pub const fn is_client_side(&self) -> bool {
        matches!(self, Self::NotAuthenticated | Self::Validation(_) | Self::Url(_))
    }
}
