//! Site content backed by the remote API: blog, volunteer contributions and
//! the admin panels.

use crate::api::ApiError;
use crate::types::ValidationError;

/// Admin review and topic repository
mod admin;
/// Blog reader
mod blog;
/// Multi-step contribution form
mod contribution;

pub use admin::{
    AdminService,
    NewTopic,
    ReviewStatus,
    Submission,
    Topic,
};
pub use blog::{
    BlogPost,
    BlogService,
    Comment,
};
pub use contribution::{
    ContributionDetails,
    ContributionForm,
    FormStep,
    MIN_CATEGORIES,
};

/// `{collection}/{id}`. Ids are limited to ASCII alphanumerics, `-` and `_`
/// so they cannot add path segments, dot segments, a query or a fragment.
fn resource_path(collection: &str, id: &str) -> Result<String, ApiError> {
    let id = id.trim();
    let valid = !id.is_empty()
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(ApiError::Validation(vec![ValidationError::new(
            "id",
            format!("'{id}' is not a valid identifier"),
        )]));
    }
    Ok(format!("{collection}/{id}"))
}
