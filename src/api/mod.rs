//! Seam to the upstream blog REST API.
//!
//! Everything the portal knows about blogs, users and contact messages comes
//! through [`BlogApi`]. Production uses [`RestBlogApi`]; tests plug in an
//! in-memory implementation.

mod rest;

#[cfg(test)]
pub(crate) mod fake;

pub use rest::RestBlogApi;

use async_trait::async_trait;
use std::time::Duration;

use crate::models::{Blog, BlogUpdate, ContactMessage, LikeRequest, Review, UserRecord};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

/// Upstream endpoints. Mutations and admin reads carry the caller's bearer
/// token; public reads go without one.
#[async_trait]
pub trait BlogApi: Send + Sync {
    /// GET /blogs
    async fn list_blogs(&self) -> Result<Vec<Blog>, ApiError>;

    /// GET /blogs/:id
    async fn get_blog(&self, id: &str) -> Result<Blog, ApiError>;

    /// GET /blogs/user/:email
    async fn blogs_by_author(&self, email: &str, token: &str) -> Result<Vec<Blog>, ApiError>;

    /// POST /blogs, returning the new id when upstream reports one.
    async fn create_blog(&self, blog: &Blog, token: &str) -> Result<Option<String>, ApiError>;

    /// PATCH /blogs/:id
    async fn update_blog(&self, id: &str, update: &BlogUpdate, token: &str)
        -> Result<(), ApiError>;

    /// DELETE /blogs/:id
    async fn delete_blog(&self, id: &str, token: &str) -> Result<(), ApiError>;

    /// POST /blogs/:id/like
    async fn like_blog(&self, id: &str, like: &LikeRequest, token: &str) -> Result<(), ApiError>;

    /// POST /blogs/:id/reviews
    async fn add_review(&self, blog_id: &str, review: &Review, token: &str)
        -> Result<(), ApiError>;

    /// DELETE /reviews/:blogId/:commentId
    async fn delete_review(&self, blog_id: &str, review_id: &str, token: &str)
        -> Result<(), ApiError>;

    /// GET /users
    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, ApiError>;

    /// GET /contactpages
    async fn list_messages(&self, token: &str) -> Result<Vec<ContactMessage>, ApiError>;

    /// POST /contactpages
    async fn create_message(&self, message: &ContactMessage) -> Result<(), ApiError>;

    /// DELETE /contactpages/:id
    async fn delete_message(&self, id: &str, token: &str) -> Result<(), ApiError>;

    /// Round-trip time to the upstream service.
    async fn health_check(&self) -> Result<Duration, ApiError>;
}
