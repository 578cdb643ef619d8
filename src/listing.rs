//! Popularity ranking, category/search filtering, sorting and pagination for
//! blog listings.
//!
//! Everything here is pure: it works on blogs already fetched from the store
//! and takes `now` explicitly so results are reproducible.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::ops::Range;
use std::str::FromStr;

use crate::config::RankingConfig;
use crate::models::{Author, Blog, Category};

/// Value of the category filter that disables it.
pub const ALL_CATEGORIES: &str = "All";

const EXCERPT_CHARS: usize = 150;

/// `views*1 + likes*2 + reviews*3`, plus the recency bonus when the blog was
/// created within the recency window before `now`.
pub fn popularity_score(blog: &Blog, now: DateTime<Utc>, cfg: &RankingConfig) -> i64 {
    let engagement = blog
        .views
        .saturating_add(blog.likes.saturating_mul(2))
        .saturating_add(blog.review_count().saturating_mul(3));
    let engagement = i64::try_from(engagement).unwrap_or(i64::MAX);

    let bonus = if is_recent(blog.created_at, now, cfg.recency_days) {
        cfg.recency_bonus
    } else {
        0
    };

    engagement.saturating_add(bonus)
}

/// Missing dates are never recent; future dates always are.
pub fn is_recent(created_at: Option<DateTime<Utc>>, now: DateTime<Utc>, window_days: i64) -> bool {
    match created_at {
        Some(created) => now.signed_duration_since(created) <= Duration::days(window_days),
        None => false,
    }
}

/// Top `trending_limit` blogs by popularity score.
pub fn trending(blogs: &[Blog], now: DateTime<Utc>, cfg: &RankingConfig) -> Vec<Blog> {
    let mut ranked = blogs.to_vec();
    ranked.sort_by_cached_key(|b| Reverse(popularity_score(b, now, cfg)));
    ranked.truncate(cfg.trending_limit);
    ranked
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SortKey {
    #[default]
    Newest,
    Oldest,
    MostViewed,
    MostLiked,
    Popular,
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "newest" => Ok(SortKey::Newest),
            "oldest" => Ok(SortKey::Oldest),
            "most-viewed" | "views" => Ok(SortKey::MostViewed),
            "most-liked" | "likes" => Ok(SortKey::MostLiked),
            "popular" | "trending" => Ok(SortKey::Popular),
            other => Err(format!("Unknown sort key: {}", other)),
        }
    }
}

/// Sorts in place. Blogs without a date compare as the earliest instant.
pub fn sort_blogs(blogs: &mut [Blog], key: SortKey, now: DateTime<Utc>, cfg: &RankingConfig) {
    match key {
        SortKey::Newest => blogs.sort_by_key(|b| Reverse(b.created_at)),
        SortKey::Oldest => blogs.sort_by_key(|b| b.created_at),
        SortKey::MostViewed => blogs.sort_by_key(|b| Reverse(b.views)),
        SortKey::MostLiked => blogs.sort_by_key(|b| Reverse(b.likes)),
        SortKey::Popular => blogs.sort_by_cached_key(|b| Reverse(popularity_score(b, now, cfg))),
    }
}

#[derive(Debug, Clone, Default)]
pub struct ListingFilter {
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListingFilter {
    pub fn new(category: Option<String>, search: Option<String>) -> Self {
        let category = category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case(ALL_CATEGORIES));
        let search = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());
        Self { category, search }
    }

    pub fn matches(&self, blog: &Blog) -> bool {
        self.matches_category(&blog.category) && self.matches_search(blog)
    }

    fn matches_category(&self, category: &Category) -> bool {
        match &self.category {
            Some(wanted) => category.matches(wanted),
            None => true,
        }
    }

    fn matches_search(&self, blog: &Blog) -> bool {
        let Some(term) = &self.search else {
            return true;
        };
        [&blog.title, &blog.content, &blog.author.name]
            .iter()
            .any(|field| field.to_lowercase().contains(term.as_str()))
    }
}

/// Filter, then sort.
pub fn filter_and_sort(
    blogs: &[Blog],
    filter: &ListingFilter,
    key: SortKey,
    now: DateTime<Utc>,
    cfg: &RankingConfig,
) -> Vec<Blog> {
    let mut matching: Vec<Blog> = blogs.iter().filter(|b| filter.matches(b)).cloned().collect();
    sort_blogs(&mut matching, key, now, cfg);
    matching
}

/// Client-side pagination over an already filtered list.
///
/// The pager keeps a visible-count watermark: page `n` shows the records
/// ending at `n * page_size`. Moving past either end is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    total: usize,
    page_size: usize,
    watermark: usize,
}

impl Pager {
    pub fn new(total: usize, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            total,
            page_size,
            watermark: page_size,
        }
    }

    /// Pager positioned at `page` (1-based), clamped to the valid range.
    pub fn at_page(total: usize, page_size: usize, page: usize) -> Self {
        let mut pager = Self::new(total, page_size);
        let page = page.clamp(1, pager.page_count());
        pager.watermark = page * pager.page_size;
        pager
    }

    pub fn page_count(&self) -> usize {
        self.total.div_ceil(self.page_size).max(1)
    }

    pub fn current_page(&self) -> usize {
        self.watermark / self.page_size
    }

    pub fn has_next(&self) -> bool {
        self.watermark < self.total
    }

    pub fn has_previous(&self) -> bool {
        self.watermark > self.page_size
    }

    pub fn next(&mut self) {
        if self.has_next() {
            self.watermark += self.page_size;
        }
    }

    pub fn previous(&mut self) {
        if self.has_previous() {
            self.watermark -= self.page_size;
        }
    }

    pub fn visible_range(&self) -> Range<usize> {
        let end = self.watermark.min(self.total);
        let start = (self.watermark - self.page_size).min(end);
        start..end
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// What a listing card needs; the full content stays on the details page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogCard {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub category: Category,
    pub tags: Vec<String>,
    pub author: Author,
    pub likes: u64,
    pub views: u64,
    pub review_count: u64,
    pub score: i64,
    pub created_at: Option<DateTime<Utc>>,
}

impl BlogCard {
    pub fn from_blog(blog: &Blog, now: DateTime<Utc>, cfg: &RankingConfig) -> Self {
        Self {
            id: blog.id.clone(),
            title: blog.title.clone(),
            excerpt: excerpt(&blog.content, EXCERPT_CHARS),
            image: blog.image.clone(),
            category: blog.category.clone(),
            tags: blog.tags.clone(),
            author: blog.author.clone(),
            likes: blog.likes,
            views: blog.views,
            review_count: blog.review_count(),
            score: popularity_score(blog, now, cfg),
            created_at: blog.created_at,
        }
    }
}

/// Plain-text prefix of rich-text content, cut on a char boundary.
pub fn excerpt(content: &str, max_chars: usize) -> String {
    let text = ammonia::Builder::empty().clean(content).to_string();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.chars().count() <= max_chars {
        return text;
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    pub items: Vec<BlogCard>,
    pub page: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

impl ListingPage {
    pub fn build(matching: &[Blog], pager: &Pager, now: DateTime<Utc>, cfg: &RankingConfig) -> Self {
        let items = matching[pager.visible_range()]
            .iter()
            .map(|b| BlogCard::from_blog(b, now, cfg))
            .collect();
        Self {
            items,
            page: pager.current_page(),
            page_count: pager.page_count(),
            page_size: pager.page_size(),
            total: pager.total(),
            has_next: pager.has_next(),
            has_previous: pager.has_previous(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

/// Posts per category, most used first, then by name.
pub fn category_counts(blogs: &[Blog]) -> Vec<CategoryCount> {
    let mut counts: std::collections::BTreeMap<&str, usize> = std::collections::BTreeMap::new();
    for blog in blogs {
        for name in blog.category.names() {
            *counts.entry(name).or_default() += 1;
        }
    }
    let mut counts: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    counts
}
