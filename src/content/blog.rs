//! Blog posts with their likes and comments.

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

/// Collection root.
const BLOGS_PATH: &str = "/blogs";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    #[serde(alias = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub likes: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub author: Option<String>,
    pub text: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /blogs/{id}/comments`.
#[derive(Debug, Serialize)]
struct NewComment<'a> {
    /// Trimmed comment text
    text: &'a str,
}

/// Blog reader. Reading is public; likes and comments need a session.
#[derive(Debug, Clone)]
pub struct BlogService {
    /// Remote API
    api: Arc<ApiClient>,
    /// Source of the bearer token
    session: Arc<SessionHolder>,
}

impl BlogService {
    pub const fn new(api: Arc<ApiClient>, session: Arc<SessionHolder>) -> Self {
        Self { api, session }
    }

    pub async fn list(&self) -> Result<Vec<BlogPost>, ApiError> {
        let token = self.session.token();
        let posts: Vec<BlogPost> = self.api.get(BLOGS_PATH, token.as_deref()).await?;
        tracing::debug!(count = posts.len(), "Fetched blog posts");
        Ok(posts)
    }

    pub async fn get(&self, id: &str) -> Result<BlogPost, ApiError> {
        let path = resource_path(BLOGS_PATH, id)?;
        self.api.get(&path, self.session.token().as_deref()).await
    }

    /// Returns the post with its updated like count.
    pub async fn like(&self, id: &str) -> Result<BlogPost, ApiError> {
        let token = self.session.require_token()?;
        let path = format!("{}/like", resource_path(BLOGS_PATH, id)?);
        self.api.post(&path, &serde_json::json!({}), Some(&token)).await
    }

    /// Posts a comment. Blank text is rejected before any request.
    pub async fn comment(&self, id: &str, text: &str) -> Result<Comment, ApiError> {
        let token = self.session.require_token()?;
        let text = text.trim();
        if text.is_empty() {
            return Err(ApiError::Validation(vec![ValidationError::new(
                "text",
                "A comment cannot be empty",
            )]));
        }
        let path = format!("{}/comments", resource_path(BLOGS_PATH, id)?);
        let comment: Comment = self.api.post(&path, &NewComment { text }, Some(&token)).await?;
        tracing::info!(post = id, "Comment added");
        Ok(comment)
    }
}
