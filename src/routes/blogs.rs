/**
 * Blog Routes
 * Listings, details and the add/update/delete/like actions
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::listing::{self, BlogCard, CategoryCount, ListingFilter, ListingPage, Pager, SortKey};
use crate::models::{Author, Blog, BlogUpdate, LikeRequest, NewBlog};
use crate::routes::{require_text, sanitize_html, validate_id, SuccessResponse};
use crate::session::{MaybeSession, Session};
use crate::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query parameters for GET /api/blogs
#[derive(Debug, Deserialize)]
pub struct ListingQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub sort: Option<String>,
    #[serde(default = "default_page")]
    pub page: usize,
}

fn default_page() -> usize {
    1
}

/// Full blog plus what the details page derives from it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogDetails {
    #[serde(flatten)]
    pub blog: Blog,
    pub score: i64,
    pub average_rating: Option<f64>,
    pub liked_by_me: bool,
    pub can_edit: bool,
}

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LikeResponse {
    pub likes: u64,
    pub liked: bool,
}

// ============================================================================
// Helpers
// ============================================================================

/// Owners may edit their own posts; admins may edit any.
async fn ensure_can_modify(state: &AppState, session: &Session, blog: &Blog) -> Result<()> {
    if blog.is_authored_by(&session.email) {
        return Ok(());
    }
    session.require_admin(&state.store).await
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    tags.into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blogs/trending - Home page trending section
pub async fn trending(State(state): State<AppState>) -> Result<Json<Vec<BlogCard>>> {
    let blogs = state.store.blogs().await?;
    let now = Utc::now();
    let cfg = &state.config.ranking;

    let cards = listing::trending(&blogs, now, cfg)
        .iter()
        .map(|b| BlogCard::from_blog(b, now, cfg))
        .collect();
    Ok(Json(cards))
}

/// GET /api/blogs - Filtered, sorted, paginated listing
pub async fn list_blogs(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> Result<Json<ListingPage>> {
    let sort = match query.sort.as_deref() {
        Some(raw) if !raw.trim().is_empty() => {
            raw.parse::<SortKey>().map_err(AppError::BadRequest)?
        }
        _ => SortKey::default(),
    };
    let filter = ListingFilter::new(query.category, query.search);

    let blogs = state.store.blogs().await?;
    let now = Utc::now();
    let cfg = &state.config.ranking;

    let matching = listing::filter_and_sort(&blogs, &filter, sort, now, cfg);
    let pager = Pager::at_page(matching.len(), state.config.listing.page_size, query.page);

    tracing::debug!(
        category = ?filter.category,
        search = ?filter.search,
        sort = ?sort,
        matching = matching.len(),
        page = pager.current_page(),
        "blog listing"
    );

    Ok(Json(ListingPage::build(&matching, &pager, now, cfg)))
}

/// GET /api/blogs/categories - Category chips with post counts
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<CategoryCount>>> {
    let blogs = state.store.blogs().await?;
    Ok(Json(listing::category_counts(&blogs)))
}

/// GET /api/blogs/mine - Blogs written by the caller, newest first
pub async fn my_blogs(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<BlogCard>>> {
    let mut blogs = state
        .store
        .blogs_by_author(&session.email, &session.token)
        .await?;
    let now = Utc::now();
    let cfg = &state.config.ranking;

    listing::sort_blogs(&mut blogs, SortKey::Newest, now, cfg);
    Ok(Json(
        blogs
            .iter()
            .map(|b| BlogCard::from_blog(b, now, cfg))
            .collect(),
    ))
}

/// GET /api/blogs/{id} - Details page
pub async fn get_blog(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
    Path(id): Path<String>,
) -> Result<Json<BlogDetails>> {
    validate_id(&id)?;
    let blog = state.store.blog(&id).await?;

    let (liked_by_me, can_edit) = match &session {
        Some(session) if blog.is_authored_by(&session.email) => {
            (blog.is_liked_by(&session.uid), true)
        }
        Some(session) => {
            // Only decorates the page; a failed lookup must not fail the view.
            let can_edit = match session.is_admin(&state.store).await {
                Ok(admin) => admin,
                Err(e) => {
                    tracing::warn!(error = %e, email = %session.email, "admin lookup failed");
                    false
                }
            };
            (blog.is_liked_by(&session.uid), can_edit)
        }
        None => (false, false),
    };

    Ok(Json(BlogDetails {
        score: listing::popularity_score(&blog, Utc::now(), &state.config.ranking),
        average_rating: blog.average_rating(),
        liked_by_me,
        can_edit,
        blog,
    }))
}

/// POST /api/blogs - Add blog form
pub async fn create_blog(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<NewBlog>,
) -> Result<(StatusCode, Json<CreatedResponse>)> {
    require_text(&payload.title, "Title")?;
    require_text(&payload.content, "Content")?;
    if payload.category.is_empty() {
        return Err(AppError::BadRequest("Category is required".to_string()));
    }

    let blog = Blog {
        title: payload.title.trim().to_string(),
        content: sanitize_html(&payload.content),
        image: payload.image.filter(|i| !i.trim().is_empty()),
        category: payload.category,
        tags: clean_tags(payload.tags),
        price: payload.price,
        author: Author {
            email: session.email.clone(),
            name: session.name.clone(),
            photo: session.photo.clone(),
        },
        created_at: Some(Utc::now()),
        ..Blog::default()
    };

    let id = state.store.create_blog(&blog, &session.token).await?;
    Ok((StatusCode::CREATED, Json(CreatedResponse { id })))
}

/// PATCH /api/blogs/{id} - Update blog form (owner or admin)
pub async fn update_blog(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(mut payload): Json<BlogUpdate>,
) -> Result<Json<Blog>> {
    validate_id(&id)?;
    if payload.is_empty() {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }
    if let Some(title) = &payload.title {
        require_text(title, "Title")?;
    }
    if let Some(content) = &payload.content {
        require_text(content, "Content")?;
    }
    if payload.category.as_ref().is_some_and(|c| c.is_empty()) {
        return Err(AppError::BadRequest("Category is required".to_string()));
    }

    let blog = state.store.blog(&id).await?;
    ensure_can_modify(&state, &session, &blog).await?;

    payload.title = payload.title.map(|t| t.trim().to_string());
    payload.content = payload.content.map(|c| sanitize_html(&c));
    payload.tags = payload.tags.map(clean_tags);

    state.store.update_blog(&blog, &payload, &session.token).await?;
    Ok(Json(state.store.blog(&id).await?))
}

/// DELETE /api/blogs/{id} - Delete (owner or admin)
pub async fn delete_blog(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    validate_id(&id)?;
    let blog = state.store.blog(&id).await?;
    ensure_can_modify(&state, &session, &blog).await?;

    state.store.delete_blog(&blog, &session.token).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/blogs/{id}/like - Toggle like
pub async fn like_blog(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>> {
    validate_id(&id)?;
    let blog = state.store.blog(&id).await?;
    if blog.is_authored_by(&session.email) {
        return Err(AppError::BadRequest(
            "You cannot like your own blog".to_string(),
        ));
    }

    let like = LikeRequest {
        user_id: session.uid.clone(),
        user_email: session.email.clone(),
    };
    let refreshed = state.store.like_blog(&blog, &like, &session.token).await?;

    Ok(Json(LikeResponse {
        likes: refreshed.likes,
        liked: refreshed.is_liked_by(&session.uid),
    }))
}
