//! Shared data-access layer over the upstream API.
//!
//! Every handler reads through one [`BlogStore`]. Concurrent reads of the same
//! key share a single upstream request, and every successful mutation drops
//! the entries it could have made stale.
//!
//! Only public data is shared between callers. Anything read with a caller's
//! token is cached under that token, so a request never sees an entry that
//! upstream did not authorize for the exact credentials it carries.

use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;

use crate::api::{ApiError, BlogApi};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::models::{Blog, BlogUpdate, ContactMessage, LikeRequest, Review, UserRecord};

#[derive(Clone)]
pub struct BlogStore {
    api: Arc<dyn BlogApi>,
    caching: bool,
    blogs: Cache<(), Arc<Vec<Blog>>>,
    blog: Cache<String, Blog>,
    /// Keyed by bearer token.
    users: Cache<String, Arc<Vec<UserRecord>>>,
    /// Keyed by bearer token.
    admin: Cache<String, bool>,
}

impl BlogStore {
    pub fn new(api: Arc<dyn BlogApi>, config: &CacheConfig) -> Self {
        let ttl = Duration::from_secs(config.ttl_secs.max(1));

        tracing::info!(
            ttl_secs = config.ttl_secs,
            max_entries = config.max_entries,
            "Initialized blog store"
        );

        Self {
            api,
            caching: config.ttl_secs > 0,
            blogs: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
            blog: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(ttl)
                .build(),
            users: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(ttl)
                .build(),
            admin: Cache::builder()
                .max_capacity(config.max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// The whole blog collection.
    pub async fn blogs(&self) -> Result<Arc<Vec<Blog>>> {
        if !self.caching {
            return Ok(Arc::new(self.api.list_blogs().await?));
        }
        let api = self.api.clone();
        let blogs = self
            .blogs
            .try_get_with((), async move { api.list_blogs().await.map(Arc::new) })
            .await?;
        Ok(blogs)
    }

    pub async fn blog(&self, id: &str) -> Result<Blog> {
        if !self.caching {
            return Ok(self.api.get_blog(id).await?);
        }
        let api = self.api.clone();
        let key = id.to_string();
        let blog = self
            .blog
            .try_get_with(key.clone(), async move { api.get_blog(&key).await })
            .await?;
        Ok(blog)
    }

    /// A single author's blogs. Always fetched with the caller's token.
    pub async fn blogs_by_author(&self, email: &str, token: &str) -> Result<Vec<Blog>> {
        Ok(self.api.blogs_by_author(email, token).await?)
    }

    pub async fn users(&self, token: &str) -> Result<Arc<Vec<UserRecord>>> {
        if !self.caching {
            return Ok(Arc::new(self.api.list_users(token).await?));
        }
        let api = self.api.clone();
        let key = token.to_string();
        let users = self
            .users
            .try_get_with(key.clone(), async move { api.list_users(&key).await.map(Arc::new) })
            .await?;
        Ok(users)
    }

    /// Whether the holder of `token` is an admin.
    ///
    /// Upstream answering 403 to the user list means "not an admin"; that
    /// answer is cached per token like a positive one.
    pub async fn is_admin(&self, email: &str, token: &str) -> Result<bool> {
        if !self.caching {
            return Ok(admin_from(self.api.list_users(token).await, email)?);
        }
        let api = self.api.clone();
        let users = self.users.clone();
        let (email, key) = (email.to_string(), token.to_string());
        let admin = self
            .admin
            .try_get_with(key.clone(), async move {
                let listed = api.list_users(&key).await;
                if let Ok(list) = &listed {
                    users.insert(key, Arc::new(list.clone())).await;
                }
                admin_from(listed, &email)
            })
            .await?;
        Ok(admin)
    }

    /// Contact messages are admin-only and rarely read; never cached.
    pub async fn messages(&self, token: &str) -> Result<Vec<ContactMessage>> {
        Ok(self.api.list_messages(token).await?)
    }

    pub async fn create_blog(&self, blog: &Blog, token: &str) -> Result<Option<String>> {
        let id = self.api.create_blog(blog, token).await?;
        self.invalidate_blog(id.as_deref()).await;
        tracing::info!(blog_id = ?id, author = %blog.author.email, "Blog created");
        Ok(id)
    }

    pub async fn update_blog(&self, blog: &Blog, update: &BlogUpdate, token: &str) -> Result<()> {
        self.api.update_blog(&blog.id, update, token).await?;
        self.invalidate_blog(Some(&blog.id)).await;
        tracing::info!(blog_id = %blog.id, "Blog updated");
        Ok(())
    }

    pub async fn delete_blog(&self, blog: &Blog, token: &str) -> Result<()> {
        self.api.delete_blog(&blog.id, token).await?;
        self.invalidate_blog(Some(&blog.id)).await;
        tracing::info!(blog_id = %blog.id, "Blog deleted");
        Ok(())
    }

    /// Toggles the like and returns the refreshed blog.
    pub async fn like_blog(&self, blog: &Blog, like: &LikeRequest, token: &str) -> Result<Blog> {
        self.api.like_blog(&blog.id, like, token).await?;
        self.invalidate_blog(Some(&blog.id)).await;
        self.blog(&blog.id).await
    }

    pub async fn add_review(&self, blog: &Blog, review: &Review, token: &str) -> Result<Blog> {
        self.api.add_review(&blog.id, review, token).await?;
        self.invalidate_blog(Some(&blog.id)).await;
        self.blog(&blog.id).await
    }

    pub async fn delete_review(&self, blog: &Blog, review_id: &str, token: &str) -> Result<Blog> {
        self.api.delete_review(&blog.id, review_id, token).await?;
        self.invalidate_blog(Some(&blog.id)).await;
        self.blog(&blog.id).await
    }

    pub async fn create_message(&self, message: &ContactMessage) -> Result<()> {
        Ok(self.api.create_message(message).await?)
    }

    pub async fn delete_message(&self, id: &str, token: &str) -> Result<()> {
        self.api.delete_message(id, token).await?;
        tracing::info!(message_id = %id, "Contact message deleted");
        Ok(())
    }

    pub async fn health_check(&self) -> Result<Duration> {
        Ok(self.api.health_check().await?)
    }

    /// Number of cached entries across all caches.
    pub fn cached_entries(&self) -> u64 {
        self.blogs.entry_count()
            + self.blog.entry_count()
            + self.users.entry_count()
            + self.admin.entry_count()
    }

    async fn invalidate_blog(&self, id: Option<&str>) {
        self.blogs.invalidate(&()).await;
        if let Some(id) = id {
            self.blog.invalidate(id).await;
        }
        tracing::debug!(blog_id = ?id, "Blog cache invalidated");
    }
}

fn admin_from(
    listed: std::result::Result<Vec<UserRecord>, ApiError>,
    email: &str,
) -> std::result::Result<bool, ApiError> {
    match listed {
        Ok(users) => Ok(users
            .iter()
            .any(|u| u.email.eq_ignore_ascii_case(email) && u.is_admin())),
        Err(ApiError::Status { status: 403, .. }) => Ok(false),
        Err(e) => Err(e),
    }
}
