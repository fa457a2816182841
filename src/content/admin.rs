//! Admin panels: contribution review and the topic repository.
//!
//! Every call carries the session token and fails with
//! [`ApiError::NotAuthenticated`] before any request while signed out.
//! Whether the user is actually an admin is for the server to decide.

use std::fmt;
use std::sync::Arc;

use serde::{
    Deserialize,
    Serialize,
};

use super::resource_path;
use crate::api::{
    ApiClient,
    ApiError,
};
use crate::session::SessionHolder;
use crate::types::ValidationError;

/// Submission listing and review.
const ADMIN_CONTRIBUTIONS_PATH: &str = "/admin/contributions";
/// Public topic listing.
const TOPICS_PATH: &str = "/topics";
/// Topic create/delete.
const ADMIN_TOPICS_PATH: &str = "/admin/topics";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        };
        f.write_str(label)
    }
}

/// A contribution as the admin list shows it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub weekly_hours: Option<u32>,
    #[serde(default)]
    pub status: ReviewStatus,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Topic {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `POST /admin/topics`.
#[derive(Debug, Clone, Serialize)]
pub struct NewTopic {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl NewTopic {
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self { title: title.into(), description: None }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Body of the review PATCH.
#[derive(Debug, Serialize)]
struct ReviewUpdate {
    /// New status
    status: ReviewStatus,
}

#[derive(Debug, Clone)]
pub struct AdminService {
    /// Remote API
    api: Arc<ApiClient>,
    /// Source of the bearer token
    session: Arc<SessionHolder>,
}

impl AdminService {
    pub const fn new(api: Arc<ApiClient>, session: Arc<SessionHolder>) -> Self {
        Self { api, session }
    }

    pub async fn list_contributions(&self) -> Result<Vec<Submission>, ApiError> {
        let token = self.session.require_token()?;
        self.api.get(ADMIN_CONTRIBUTIONS_PATH, Some(&token)).await
    }

    /// Returns the updated submission.
    pub async fn review(&self, id: &str, status: ReviewStatus) -> Result<Submission, ApiError> {
        let token = self.session.require_token()?;
        let path = resource_path(ADMIN_CONTRIBUTIONS_PATH, id)?;
        let updated: Submission =
            self.api.patch(&path, &ReviewUpdate { status }, Some(&token)).await?;
        tracing::info!(submission = id, %status, "Contribution reviewed");
        Ok(updated)
    }

    pub async fn list_topics(&self) -> Result<Vec<Topic>, ApiError> {
        let token = self.session.require_token()?;
        self.api.get(TOPICS_PATH, Some(&token)).await
    }

    /// Title must not be blank; checked before any request.
    pub async fn create_topic(&self, topic: &NewTopic) -> Result<Topic, ApiError> {
        let token = self.session.require_token()?;
        if topic.title.trim().is_empty() {
            return Err(ApiError::Validation(vec![ValidationError::new(
                "title",
                "A topic needs a title",
            )]));
        }
        let created: Topic = self.api.post(ADMIN_TOPICS_PATH, topic, Some(&token)).await?;
        tracing::info!(topic = %created.id, "Topic created");
        Ok(created)
    }

    pub async fn delete_topic(&self, id: &str) -> Result<(), ApiError> {
        let token = self.session.require_token()?;
        let path = resource_path(ADMIN_TOPICS_PATH, id)?;
        let _: serde_json::Value = self.api.delete(&path, Some(&token)).await?;
        tracing::info!(topic = id, "Topic deleted");
        Ok(())
    }
}
