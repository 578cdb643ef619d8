/**
 * Contact Route
 * Public contact form
 */
use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;

use crate::error::{AppError, Result};
use crate::models::{ContactMessage, NewContactMessage};
use crate::routes::{is_valid_email, require_text, SuccessResponse};
use crate::AppState;

const MAX_MESSAGE_CHARS: usize = 5_000;

/// POST /api/contact - Submit a contact message
pub async fn submit_message(
    State(state): State<AppState>,
    Json(payload): Json<NewContactMessage>,
) -> Result<(StatusCode, Json<SuccessResponse>)> {
    require_text(&payload.name, "Name")?;
    require_text(&payload.message, "Message")?;

    let email = payload.email.trim();
    if !is_valid_email(email) {
        return Err(AppError::BadRequest("A valid email is required".to_string()));
    }
    if payload.message.chars().count() > MAX_MESSAGE_CHARS {
        return Err(AppError::BadRequest("Message is too long".to_string()));
    }

    let message = ContactMessage {
        id: String::new(),
        name: payload.name.trim().to_string(),
        email: email.to_string(),
        message: payload.message.trim().to_string(),
        created_at: Some(Utc::now()),
    };
    state.store.create_message(&message).await?;
    tracing::info!(email = %message.email, "Contact message received");

    Ok((StatusCode::CREATED, Json(SuccessResponse { success: true })))
}

#[cfg(test)]
mod tests {
    use crate::api::fake::FakeBlogApi;
    use crate::routes::testing::{app, send};
    use axum::http::StatusCode;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_contact_is_public() {
        let api = Arc::new(FakeBlogApi::default());
        let (status, body) = send(
            app(api.clone()),
            "POST",
            "/api/contact",
            None,
            Some(json!({ "name": "Ann", "email": " ann@x.io ", "message": "Hello there" })),
        )
        .await;

        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["success"], true);

        let stored = api.messages.lock().unwrap()[0].clone();
        assert_eq!(stored.email, "ann@x.io");
        assert!(stored.created_at.is_some());
    }

    #[tokio::test]
    async fn test_contact_validates_fields() {
        let api = Arc::new(FakeBlogApi::default());
        let cases = [
            json!({ "name": "", "email": "ann@x.io", "message": "hi" }),
            json!({ "name": "Ann", "email": "not-an-email", "message": "hi" }),
            json!({ "name": "Ann", "email": "ann@x.io", "message": "   " }),
        ];
        for body in cases {
            let (status, _) = send(app(api.clone()), "POST", "/api/contact", None, Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
        }
        assert!(api.messages.lock().unwrap().is_empty());
    }
}
