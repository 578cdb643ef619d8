/**
 * Review Routes
 * Comment + rating form on the blog details page
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{NewReview, Review};
use crate::routes::{require_text, validate_id};
use crate::session::Session;
use crate::AppState;

const MAX_RATING: u8 = 5;

/// POST /api/blogs/{id}/reviews - Add a review, returns the updated review list
pub async fn add_review(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
    Json(payload): Json<NewReview>,
) -> Result<(StatusCode, Json<Vec<Review>>)> {
    validate_id(&id)?;
    require_text(&payload.comment, "Comment")?;

    let blog = state.store.blog(&id).await?;
    let review = Review {
        id: None,
        user_id: session.uid.clone(),
        user_name: session.name.clone(),
        user_image: session.photo.clone(),
        comment: payload.comment.trim().to_string(),
        rating: payload.rating.min(MAX_RATING),
        date: Some(Utc::now()),
        blog_id: blog.id.clone(),
    };

    let refreshed = state.store.add_review(&blog, &review, &session.token).await?;
    tracing::info!(blog_id = %id, user_id = %session.uid, "Review added");

    Ok((StatusCode::CREATED, Json(refreshed.reviews)))
}

/// DELETE /api/blogs/{id}/reviews/{review_id} - Reviewer or admin only
pub async fn delete_review(
    State(state): State<AppState>,
    session: Session,
    Path((id, review_id)): Path<(String, String)>,
) -> Result<Json<Vec<Review>>> {
    validate_id(&id)?;
    validate_id(&review_id)?;

    let blog = state.store.blog(&id).await?;
    let review = blog
        .reviews
        .iter()
        .find(|r| r.id.as_deref() == Some(review_id.as_str()))
        .ok_or_else(|| AppError::NotFound(format!("review {}", review_id)))?;

    if review.user_id != session.uid {
        session.require_admin(&state.store).await?;
    }

    let refreshed = state
        .store
        .delete_review(&blog, &review_id, &session.token)
        .await?;
    tracing::info!(blog_id = %id, review_id = %review_id, "Review deleted");

    Ok(Json(refreshed.reviews))
}
