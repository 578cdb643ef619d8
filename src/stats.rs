//! Admin dashboard figures and the author presence heuristic.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::RankingConfig;
use crate::listing::{self, CategoryCount};
use crate::models::{Blog, ContactMessage, UserRecord};

const CHART_MONTHS: u32 = 6;
const TOP_N: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorStatus {
    Active,
    Offline,
}

/// Active when the last login is within `window` of `now`.
pub fn author_status(
    last_login: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    window: Duration,
) -> AuthorStatus {
    match last_login {
        Some(at) if now.signed_duration_since(at) <= window => AuthorStatus::Active,
        _ => AuthorStatus::Offline,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub blogs: usize,
    pub users: usize,
    pub messages: usize,
    pub likes: u64,
    pub views: u64,
    pub reviews: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartDataPoint {
    pub date: String,
    pub value: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedBlog {
    pub id: String,
    pub title: String,
    pub score: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorCount {
    pub email: String,
    pub name: String,
    pub posts: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub totals: Totals,
    pub average_rating: Option<f64>,
    pub posts_per_category: Vec<CategoryCount>,
    pub posts_per_month: Vec<ChartDataPoint>,
    pub top_blogs: Vec<RankedBlog>,
    pub top_authors: Vec<AuthorCount>,
}

pub fn dashboard(
    blogs: &[Blog],
    users: &[UserRecord],
    messages: &[ContactMessage],
    now: DateTime<Utc>,
    cfg: &RankingConfig,
) -> DashboardStats {
    let totals = Totals {
        blogs: blogs.len(),
        users: users.len(),
        messages: messages.len(),
        likes: blogs.iter().map(|b| b.likes).sum(),
        views: blogs.iter().map(|b| b.views).sum(),
        reviews: blogs.iter().map(|b| b.review_count()).sum(),
    };

    let ratings: Vec<f64> = blogs
        .iter()
        .flat_map(|b| b.reviews.iter())
        .filter(|r| r.rating > 0)
        .map(|r| f64::from(r.rating))
        .collect();
    let average_rating = if ratings.is_empty() {
        None
    } else {
        Some(ratings.iter().sum::<f64>() / ratings.len() as f64)
    };

    let top_blogs = listing::trending(blogs, now, &RankingConfig {
        trending_limit: TOP_N,
        ..cfg.clone()
    })
    .into_iter()
    .map(|b| RankedBlog {
        score: listing::popularity_score(&b, now, cfg),
        id: b.id,
        title: b.title,
    })
    .collect();

    DashboardStats {
        totals,
        average_rating,
        posts_per_category: listing::category_counts(blogs),
        posts_per_month: posts_per_month(blogs, now),
        top_blogs,
        top_authors: top_authors(blogs),
    }
}

/// Post counts for the last few calendar months, oldest first, `YYYY-MM` keys.
fn posts_per_month(blogs: &[Blog], now: DateTime<Utc>) -> Vec<ChartDataPoint> {
    let mut months = Vec::with_capacity(CHART_MONTHS as usize);
    let (mut year, mut month) = (now.year(), now.month());
    for _ in 0..CHART_MONTHS {
        months.push((year, month));
        if month == 1 {
            year -= 1;
            month = 12;
        } else {
            month -= 1;
        }
    }
    months.reverse();

    let mut counts: HashMap<(i32, u32), usize> = HashMap::new();
    for created in blogs.iter().filter_map(|b| b.created_at) {
        *counts.entry((created.year(), created.month())).or_default() += 1;
    }

    months
        .into_iter()
        .map(|(year, month)| ChartDataPoint {
            date: NaiveDate::from_ymd_opt(year, month, 1)
                .map(|d| d.format("%Y-%m").to_string())
                .unwrap_or_default(),
            value: counts.get(&(year, month)).copied().unwrap_or(0),
        })
        .collect()
}

fn top_authors(blogs: &[Blog]) -> Vec<AuthorCount> {
    let mut by_email: HashMap<String, AuthorCount> = HashMap::new();
    for blog in blogs.iter().filter(|b| !b.author.email.is_empty()) {
        let entry = by_email
            .entry(blog.author.email.to_lowercase())
            .or_insert_with(|| AuthorCount {
                email: blog.author.email.clone(),
                name: blog.author.name.clone(),
                posts: 0,
            });
        entry.posts += 1;
    }
    let mut authors: Vec<AuthorCount> = by_email.into_values().collect();
    authors.sort_by(|a, b| b.posts.cmp(&a.posts).then_with(|| a.email.cmp(&b.email)));
    authors.truncate(TOP_N);
    authors
}
