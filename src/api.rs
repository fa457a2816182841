//! Remote API access.
//!
//! Every call site receives either the decoded payload or an [`ApiError`];
//! nothing here panics or leaves a rejected future unhandled.

/// HTTP client and response classification
mod client;
/// Error taxonomy
mod error;

pub use client::{
    ApiClient,
    user_agent,
};
pub use error::ApiError;
