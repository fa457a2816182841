//! Authentication state with persistence across restarts.

use thiserror::Error;

use crate::api::ApiError;
use crate::types::{
    ValidationError,
    format_validation_errors,
};

/// Session holder
mod holder;
/// Save/load against a key-value store
pub mod persist;
/// Record and payload types
mod record;

pub use holder::SessionHolder;
pub use record::{
    Credentials,
    SessionRecord,
    SignupDetails,
};

#[derive(Error, Debug)]
pub enum SessionError {
    /// The server refused the credentials; carries its message
    #[error("{0}")]
    Authentication(String),

    #[error("Please correct the following:\n{}", format_validation_errors(.0))]
    Invalid(Vec<ValidationError>),

    #[error(transparent)]
    Api(#[from] ApiError),
}
