//! Records exchanged with the upstream blog API.
//!
//! The upstream JSON is loosely typed: counters sometimes arrive as strings or
//! `null`, dates as RFC 3339 strings, HTTP dates or epoch milliseconds. The
//! `lenient` deserializers normalize all of that so missing counters read as 0
//! and unusable dates read as `None`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A blog category. Older posts carry one name, newer ones a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Category {
    Single(String),
    Many(Vec<String>),
}

impl Default for Category {
    fn default() -> Self {
        Category::Single(String::new())
    }
}

impl Category {
    /// Exact match for a single category, containment for a list.
    pub fn matches(&self, wanted: &str) -> bool {
        match self {
            Category::Single(name) => name == wanted,
            Category::Many(names) => names.iter().any(|name| name == wanted),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        match self {
            Category::Single(name) if name.trim().is_empty() => Vec::new(),
            Category::Single(name) => vec![name.as_str()],
            Category::Many(names) => names
                .iter()
                .map(String::as_str)
                .filter(|name| !name.trim().is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.names().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "displayName")]
    pub name: String,
    #[serde(default, alias = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    #[serde(
        rename = "_id",
        alias = "id",
        alias = "commentId",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<String>,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_image: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default, deserialize_with = "lenient::rating")]
    pub rating: u8,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub blog_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "lenient::category")]
    pub category: Category,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub tags: Vec<String>,
    #[serde(
        default,
        deserialize_with = "lenient::price",
        skip_serializing_if = "Option::is_none"
    )]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub author: Author,
    #[serde(default, deserialize_with = "lenient::count")]
    pub likes: u64,
    #[serde(default, deserialize_with = "lenient::strings")]
    pub liked_users: Vec<String>,
    #[serde(default, deserialize_with = "lenient::or_default")]
    pub reviews: Vec<Review>,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient::count")]
    pub views: u64,
}

impl Blog {
    pub fn review_count(&self) -> u64 {
        self.reviews.len() as u64
    }

    pub fn is_authored_by(&self, email: &str) -> bool {
        !email.is_empty() && self.author.email.eq_ignore_ascii_case(email)
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.liked_users.iter().any(|id| id == user_id)
    }

    pub fn average_rating(&self) -> Option<f64> {
        let rated: Vec<u8> = self
            .reviews
            .iter()
            .map(|r| r.rating)
            .filter(|r| *r > 0)
            .collect();
        if rated.is_empty() {
            return None;
        }
        Some(rated.iter().map(|r| f64::from(*r)).sum::<f64>() / rated.len() as f64)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, deserialize_with = "lenient::timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(default, alias = "_id", alias = "userId")]
    pub uid: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "name")]
    pub display_name: String,
    #[serde(
        rename = "photoURL",
        alias = "photoUrl",
        alias = "photo",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub photo_url: Option<String>,
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(
        default,
        alias = "lastLogin",
        alias = "lastSignInTime",
        deserialize_with = "lenient::timestamp"
    )]
    pub last_login_at: Option<DateTime<Utc>>,
}

fn default_role() -> String {
    "user".to_string()
}

impl UserRecord {
    pub fn is_admin(&self) -> bool {
        self.role.eq_ignore_ascii_case("admin")
    }
}

// ============================================================================
// Payloads
// ============================================================================

/// Body of the add-blog form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlog {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub price: Option<f64>,
}

/// Partial update from the update-blog form. Absent fields stay untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl BlogUpdate {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.image.is_none()
            && self.category.is_none()
            && self.tags.is_none()
            && self.price.is_none()
    }
}

/// Body of the review form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReview {
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub rating: u8,
}

/// Sent upstream on like; upstream toggles membership in `likedUsers`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub user_id: String,
    pub user_email: String,
}

/// Body of the public contact form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContactMessage {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

pub(crate) mod lenient {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::Category;

    pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    pub fn rating<'de, D>(deserializer: D) -> Result<u8, D::Error>
    where
        D: Deserializer<'de>,
    {
        count(deserializer).map(|n| n.min(u64::from(u8::MAX)) as u8)
    }

    pub fn price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse().ok(),
            _ => None,
        })
    }

    pub fn strings<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .collect(),
            Some(Value::String(s)) if !s.is_empty() => vec![s],
            _ => Vec::new(),
        })
    }

    /// `null` reads as the type's default.
    pub fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
    }

    pub fn category<'de, D>(deserializer: D) -> Result<Category, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(match value {
            Some(Value::String(s)) => Category::Single(s),
            Some(Value::Array(items)) => Category::Many(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => Category::default(),
        })
    }

    pub fn timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<Value>::deserialize(deserializer)?;
        Ok(value.and_then(|v| match v {
            Value::String(s) => parse_date(&s),
            Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
            _ => None,
        }))
    }

    pub fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        DateTime::parse_from_rfc3339(raw)
            .or_else(|_| DateTime::parse_from_rfc2822(raw))
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    }
}
