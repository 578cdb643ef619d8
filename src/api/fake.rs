//! In-memory `BlogApi` used by unit and router tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use super::{ApiError, BlogApi};
use crate::models::{Blog, BlogUpdate, ContactMessage, LikeRequest, Review, UserRecord};

#[derive(Default)]
pub struct FakeBlogApi {
    pub blogs: Mutex<Vec<Blog>>,
    pub users: Mutex<Vec<UserRecord>>,
    pub messages: Mutex<Vec<ContactMessage>>,
    pub tokens: Mutex<Vec<String>>,
    /// When non-empty, authenticated reads reject any other token with 401.
    pub accepted_tokens: Mutex<Vec<String>>,
    /// When non-empty, `list_users` answers 403 to any other token.
    pub admin_tokens: Mutex<Vec<String>>,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub mutations: AtomicUsize,
    pub down: AtomicBool,
    next_id: AtomicUsize,
}

impl FakeBlogApi {
    pub fn with_blogs(blogs: Vec<Blog>) -> Self {
        let api = Self::default();
        *api.blogs.lock().unwrap() = blogs;
        api
    }

    pub fn with_users(self, users: Vec<UserRecord>) -> Self {
        *self.users.lock().unwrap() = users;
        self
    }

    pub fn with_messages(self, messages: Vec<ContactMessage>) -> Self {
        *self.messages.lock().unwrap() = messages;
        self
    }

    fn check_up(&self) -> Result<(), ApiError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        Ok(())
    }

    pub fn accepting(self, tokens: &[&str]) -> Self {
        *self.accepted_tokens.lock().unwrap() = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn admins_only(self, tokens: &[&str]) -> Self {
        *self.admin_tokens.lock().unwrap() = tokens.iter().map(|t| t.to_string()).collect();
        self
    }

    fn authorize(&self, token: &str) -> Result<(), ApiError> {
        let accepted = self.accepted_tokens.lock().unwrap();
        if !accepted.is_empty() && !accepted.iter().any(|t| t == token) {
            return Err(ApiError::Status {
                status: 401,
                message: "invalid token".to_string(),
            });
        }
        Ok(())
    }

    fn record(&self, token: &str) {
        self.tokens.lock().unwrap().push(token.to_string());
        self.mutations.fetch_add(1, Ordering::SeqCst);
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            message: format!("{} not found", what),
        }
    }
}

#[async_trait]
impl BlogApi for FakeBlogApi {
    async fn list_blogs(&self) -> Result<Vec<Blog>, ApiError> {
        self.check_up()?;
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        // Let concurrent callers overlap so coalescing is observable.
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(self.blogs.lock().unwrap().clone())
    }

    async fn get_blog(&self, id: &str) -> Result<Blog, ApiError> {
        self.check_up()?;
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        self.blogs
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| Self::not_found("blog"))
    }

    async fn blogs_by_author(&self, email: &str, token: &str) -> Result<Vec<Blog>, ApiError> {
        self.check_up()?;
        self.authorize(token)?;
        Ok(self
            .blogs
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.author.email == email)
            .cloned()
            .collect())
    }

    async fn create_blog(&self, blog: &Blog, token: &str) -> Result<Option<String>, ApiError> {
        self.check_up()?;
        self.record(token);
        let id = self.fresh_id("blog-");
        let mut stored = blog.clone();
        stored.id = id.clone();
        self.blogs.lock().unwrap().push(stored);
        Ok(Some(id))
    }

    async fn update_blog(
        &self,
        id: &str,
        update: &BlogUpdate,
        token: &str,
    ) -> Result<(), ApiError> {
        self.check_up()?;
        self.record(token);
        let mut blogs = self.blogs.lock().unwrap();
        let blog = blogs
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| Self::not_found("blog"))?;
        if let Some(title) = &update.title {
            blog.title = title.clone();
        }
        if let Some(content) = &update.content {
            blog.content = content.clone();
        }
        if let Some(image) = &update.image {
            blog.image = Some(image.clone());
        }
        if let Some(category) = &update.category {
            blog.category = category.clone();
        }
        if let Some(tags) = &update.tags {
            blog.tags = tags.clone();
        }
        if let Some(price) = update.price {
            blog.price = Some(price);
        }
        Ok(())
    }

    async fn delete_blog(&self, id: &str, token: &str) -> Result<(), ApiError> {
        self.check_up()?;
        self.record(token);
        let mut blogs = self.blogs.lock().unwrap();
        let before = blogs.len();
        blogs.retain(|b| b.id != id);
        if blogs.len() == before {
            return Err(Self::not_found("blog"));
        }
        Ok(())
    }

    async fn like_blog(&self, id: &str, like: &LikeRequest, token: &str) -> Result<(), ApiError> {
        self.check_up()?;
        self.record(token);
        let mut blogs = self.blogs.lock().unwrap();
        let blog = blogs
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| Self::not_found("blog"))?;
        if blog.is_liked_by(&like.user_id) {
            blog.liked_users.retain(|u| u != &like.user_id);
            blog.likes = blog.likes.saturating_sub(1);
        } else {
            blog.liked_users.push(like.user_id.clone());
            blog.likes += 1;
        }
        Ok(())
    }

    async fn add_review(
        &self,
        blog_id: &str,
        review: &Review,
        token: &str,
    ) -> Result<(), ApiError> {
        self.check_up()?;
        self.record(token);
        let id = self.fresh_id("review-");
        let mut blogs = self.blogs.lock().unwrap();
        let blog = blogs
            .iter_mut()
            .find(|b| b.id == blog_id)
            .ok_or_else(|| Self::not_found("blog"))?;
        let mut stored = review.clone();
        stored.id = Some(id);
        blog.reviews.push(stored);
        Ok(())
    }

    async fn delete_review(
        &self,
        blog_id: &str,
        review_id: &str,
        token: &str,
    ) -> Result<(), ApiError> {
        self.check_up()?;
        self.record(token);
        let mut blogs = self.blogs.lock().unwrap();
        let blog = blogs
            .iter_mut()
            .find(|b| b.id == blog_id)
            .ok_or_else(|| Self::not_found("blog"))?;
        blog.reviews
            .retain(|r| r.id.as_deref() != Some(review_id));
        Ok(())
    }

    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, ApiError> {
        self.check_up()?;
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.authorize(token)?;
        let admins = self.admin_tokens.lock().unwrap();
        if !admins.is_empty() && !admins.iter().any(|t| t == token) {
            return Err(ApiError::Status {
                status: 403,
                message: "admin only".to_string(),
            });
        }
        drop(admins);
        Ok(self.users.lock().unwrap().clone())
    }

    async fn list_messages(&self, token: &str) -> Result<Vec<ContactMessage>, ApiError> {
        self.check_up()?;
        self.authorize(token)?;
        Ok(self.messages.lock().unwrap().clone())
    }

    async fn create_message(&self, message: &ContactMessage) -> Result<(), ApiError> {
        self.check_up()?;
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let mut stored = message.clone();
        stored.id = self.fresh_id("msg-");
        self.messages.lock().unwrap().push(stored);
        Ok(())
    }

    async fn delete_message(&self, id: &str, token: &str) -> Result<(), ApiError> {
        self.check_up()?;
        self.record(token);
        let mut messages = self.messages.lock().unwrap();
        let before = messages.len();
        messages.retain(|m| m.id != id);
        if messages.len() == before {
            return Err(Self::not_found("message"));
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<Duration, ApiError> {
        self.check_up()?;
        Ok(Duration::from_millis(1))
    }
}
