use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::{Duration, Instant};

use super::{ApiError, BlogApi};
use crate::config::ApiConfig;
use crate::models::{Blog, BlogUpdate, ContactMessage, LikeRequest, Review, UserRecord};

/// reqwest client for the upstream blog API.
#[derive(Clone)]
pub struct RestBlogApi {
    client: Client,
    base_url: String,
}

impl RestBlogApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);
        match token {
            Some(token) if !token.is_empty() => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder.send().await.map_err(|e| {
            tracing::error!("Failed to reach blog API: {}", e);
            ApiError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(status = %status, "blog API returned an error");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, ApiError> {
        self.send(builder)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        self.send(builder).await.map(|_| ())
    }
}

/// Upstream acknowledges inserts in a few shapes; pick the id out of any.
fn inserted_id(ack: &Value) -> Option<String> {
    ["insertedId", "_id", "id"]
        .iter()
        .find_map(|key| ack.get(*key))
        .and_then(|id| match id {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
}

fn segment(raw: &str) -> String {
    urlencoding::encode(raw).into_owned()
}

#[async_trait]
impl BlogApi for RestBlogApi {
    async fn list_blogs(&self) -> Result<Vec<Blog>, ApiError> {
        self.fetch(self.request(Method::GET, "/blogs", None)).await
    }

    async fn get_blog(&self, id: &str) -> Result<Blog, ApiError> {
        let path = format!("/blogs/{}", segment(id));
        self.fetch(self.request(Method::GET, &path, None)).await
    }

    async fn blogs_by_author(&self, email: &str, token: &str) -> Result<Vec<Blog>, ApiError> {
        let path = format!("/blogs/user/{}", segment(email));
        self.fetch(self.request(Method::GET, &path, Some(token))).await
    }

    async fn create_blog(&self, blog: &Blog, token: &str) -> Result<Option<String>, ApiError> {
        let response = self
            .send(self.request(Method::POST, "/blogs", Some(token)).json(blog))
            .await?;
        // An empty or non-JSON body is still a successful insert.
        let ack: Value = response.json().await.unwrap_or(Value::Null);
        Ok(inserted_id(&ack))
    }

    async fn update_blog(
        &self,
        id: &str,
        update: &BlogUpdate,
        token: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/blogs/{}", segment(id));
        self.execute(self.request(Method::PATCH, &path, Some(token)).json(update))
            .await
    }

    async fn delete_blog(&self, id: &str, token: &str) -> Result<(), ApiError> {
        let path = format!("/blogs/{}", segment(id));
        self.execute(self.request(Method::DELETE, &path, Some(token)))
            .await
    }

    async fn like_blog(&self, id: &str, like: &LikeRequest, token: &str) -> Result<(), ApiError> {
        let path = format!("/blogs/{}/like", segment(id));
        self.execute(self.request(Method::POST, &path, Some(token)).json(like))
            .await
    }

    async fn add_review(
        &self,
        blog_id: &str,
        review: &Review,
        token: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/blogs/{}/reviews", segment(blog_id));
        self.execute(self.request(Method::POST, &path, Some(token)).json(review))
            .await
    }

    async fn delete_review(
        &self,
        blog_id: &str,
        review_id: &str,
        token: &str,
    ) -> Result<(), ApiError> {
        let path = format!("/reviews/{}/{}", segment(blog_id), segment(review_id));
        self.execute(self.request(Method::DELETE, &path, Some(token)))
            .await
    }

    async fn list_users(&self, token: &str) -> Result<Vec<UserRecord>, ApiError> {
        self.fetch(self.request(Method::GET, "/users", Some(token)))
            .await
    }

    async fn list_messages(&self, token: &str) -> Result<Vec<ContactMessage>, ApiError> {
        self.fetch(self.request(Method::GET, "/contactpages", Some(token)))
            .await
    }

    async fn create_message(&self, message: &ContactMessage) -> Result<(), ApiError> {
        self.execute(self.request(Method::POST, "/contactpages", None).json(message))
            .await
    }

    async fn delete_message(&self, id: &str, token: &str) -> Result<(), ApiError> {
        let path = format!("/contactpages/{}", segment(id));
        self.execute(self.request(Method::DELETE, &path, Some(token)))
            .await
    }

    async fn health_check(&self) -> Result<Duration, ApiError> {
        let start = Instant::now();
        let response = self
            .request(Method::GET, "/", None)
            .send()
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?;

        // Any answer short of a server error means the service is up.
        if response.status().is_server_error() {
            return Err(ApiError::Status {
                status: response.status().as_u16(),
                message: "blog API unhealthy".to_string(),
            });
        }

        Ok(start.elapsed())
    }
}
