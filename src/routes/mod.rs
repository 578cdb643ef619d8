/**
 * Routes Module
 * One handler module per page of the blog client
 */
pub mod admin;
pub mod blogs;
pub mod contact;
pub mod health;
pub mod logs;
pub mod preferences;
pub mod reviews;
pub mod rss;

use regex::Regex;
use serde::Serialize;

use crate::error::{AppError, Result};

/// Success response (for deletes)
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

lazy_static::lazy_static! {
    /// Upstream record ids: object ids, uuids, slugs
    static ref ID_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();

    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub(crate) fn is_valid_id(id: &str) -> bool {
    ID_REGEX.is_match(id)
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}

pub(crate) fn validate_id(id: &str) -> Result<()> {
    if is_valid_id(id) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Invalid id: {}", id)))
    }
}

/// Rich-text bodies come from the browser editor; strip anything unsafe
/// before they reach the API.
pub(crate) fn sanitize_html(html: &str) -> String {
    ammonia::clean(html)
}

pub(crate) fn require_text(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AppError::BadRequest(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    use crate::api::fake::FakeBlogApi;
    use crate::config::AppConfig;
    use crate::models::{Author, Blog, UserRecord};
    use crate::store::BlogStore;
    use crate::AppState;

    pub fn app(api: Arc<FakeBlogApi>) -> Router {
        let config = AppConfig::default();
        let store = BlogStore::new(api, &config.cache);
        crate::api_router().with_state(AppState::new(config, store))
    }

    pub fn blog(id: &str, email: &str) -> Blog {
        Blog {
            id: id.to_string(),
            title: format!("Post {}", id),
            content: format!("<p>Body of {}</p>", id),
            author: Author {
                email: email.to_string(),
                name: email.split('@').next().unwrap_or_default().to_string(),
                photo: None,
            },
            created_at: Some(chrono::Utc::now()),
            ..Blog::default()
        }
    }

    pub fn user(uid: &str, email: &str, role: &str) -> UserRecord {
        UserRecord {
            uid: uid.to_string(),
            email: email.to_string(),
            display_name: uid.to_string(),
            role: role.to_string(),
            ..UserRecord::default()
        }
    }

    pub async fn send(
        app: Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header("authorization", format!("Bearer {}", token));
        }
        let req = match body {
            Some(body) => req
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => req.body(Body::empty()).unwrap(),
        };

        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_validation() {
        assert!(is_valid_id("65f0c1a2b3"));
        assert!(is_valid_id("my-post_1"));
        assert!(!is_valid_id(""));
        assert!(!is_valid_id("../etc"));
        assert!(!is_valid_id(&"a".repeat(65)));
    }

    #[test]
    fn test_email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.io"));
    }

    #[test]
    fn test_sanitize_html_drops_scripts() {
        let clean = sanitize_html("<p>hi</p><script>alert(1)</script>");
        assert_eq!(clean, "<p>hi</p>");
    }
}
