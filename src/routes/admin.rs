/**
 * Admin Routes
 * Dashboard statistics, contact inbox and the user list
 */
use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::models::{ContactMessage, UserRecord};
use crate::routes::{validate_id, SuccessResponse};
use crate::session::Session;
use crate::stats::{self, AuthorStatus, DashboardStats};
use crate::AppState;

/// User row of the admin users page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserWithStatus {
    #[serde(flatten)]
    pub user: UserRecord,
    pub status: AuthorStatus,
}

fn newest_first(messages: &mut [ContactMessage]) {
    messages.sort_by_key(|m| std::cmp::Reverse(m.created_at));
}

/// GET /api/admin/messages
pub async fn list_messages(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<ContactMessage>>> {
    session.require_admin(&state.store).await?;

    let mut messages = state.store.messages(&session.token).await?;
    newest_first(&mut messages);
    Ok(Json(messages))
}

/// DELETE /api/admin/messages/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>> {
    validate_id(&id)?;
    session.require_admin(&state.store).await?;

    state.store.delete_message(&id, &session.token).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// GET /api/admin/users - Users with their presence status
pub async fn list_users(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<Vec<UserWithStatus>>> {
    session.require_admin(&state.store).await?;

    let users = state.store.users(&session.token).await?;
    let window = Duration::minutes(state.config.presence.active_window_minutes);
    Ok(Json(with_status(&users, Utc::now(), window)))
}

fn with_status(users: &[UserRecord], now: DateTime<Utc>, window: Duration) -> Vec<UserWithStatus> {
    users
        .iter()
        .map(|user| UserWithStatus {
            status: stats::author_status(user.last_login_at, now, window),
            user: user.clone(),
        })
        .collect()
}

/// GET /api/admin/stats - Dashboard figures
pub async fn stats(
    State(state): State<AppState>,
    session: Session,
) -> Result<Json<DashboardStats>> {
    session.require_admin(&state.store).await?;

    let (blogs, users, messages) = tokio::try_join!(
        state.store.blogs(),
        state.store.users(&session.token),
        state.store.messages(&session.token),
    )?;

    Ok(Json(stats::dashboard(
        &blogs,
        &users,
        &messages,
        Utc::now(),
        &state.config.ranking,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBlogApi;
    use crate::routes::testing::{app, blog, send, user};
    use crate::session::tests::{token_for, token_signed_with};
    use axum::http::StatusCode;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn admin_api() -> FakeBlogApi {
        let mut active = user("u1", "ann@x.io", "user");
        active.last_login_at = Some(Utc::now() - Duration::minutes(1));
        let mut idle = user("u2", "bob@x.io", "user");
        idle.last_login_at = Some(Utc::now() - Duration::hours(3));

        FakeBlogApi::with_blogs(vec![blog("b1", "ann@x.io"), blog("b2", "ann@x.io")])
            .with_users(vec![user("adm", "root@x.io", "admin"), active, idle])
            .with_messages(vec![
                ContactMessage {
                    id: "m1".to_string(),
                    message: "old".to_string(),
                    created_at: Some(Utc::now() - Duration::days(2)),
                    ..ContactMessage::default()
                },
                ContactMessage {
                    id: "m2".to_string(),
                    message: "new".to_string(),
                    created_at: Some(Utc::now()),
                    ..ContactMessage::default()
                },
            ])
    }

    fn admin_token() -> String {
        token_for("adm", "root@x.io", "Root")
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let api = Arc::new(admin_api());
        let token = token_for("u1", "ann@x.io", "Ann");
        for uri in ["/api/admin/messages", "/api/admin/users", "/api/admin/stats"] {
            let (status, body) = send(app(api.clone()), "GET", uri, Some(&token), None).await;
            assert_eq!(status, StatusCode::FORBIDDEN, "{}", uri);
            assert_eq!(body["error"]["code"], "FORBIDDEN");
        }
    }

    #[tokio::test]
    async fn test_anonymous_is_unauthenticated() {
        let api = Arc::new(admin_api());
        let (status, _) = send(app(api), "GET", "/api/admin/stats", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_messages_newest_first() {
        let api = Arc::new(admin_api());
        let (status, body) =
            send(app(api), "GET", "/api/admin/messages", Some(&admin_token()), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["_id"], "m2");
        assert_eq!(body[1]["_id"], "m1");
    }

    #[tokio::test]
    async fn test_delete_message() {
        let api = Arc::new(admin_api());
        let (status, _) = send(
            app(api.clone()),
            "DELETE",
            "/api/admin/messages/m1",
            Some(&admin_token()),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(api.messages.lock().unwrap().len(), 1);

        let (status, _) = send(
            app(api),
            "DELETE",
            "/api/admin/messages/m1",
            Some(&admin_token()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_users_carry_presence() {
        let api = Arc::new(admin_api());
        let (status, body) =
            send(app(api), "GET", "/api/admin/users", Some(&admin_token()), None).await;

        assert_eq!(status, StatusCode::OK);
        let users = body.as_array().unwrap();
        let status_of = |email: &str| {
            users
                .iter()
                .find(|u| u["email"] == email)
                .map(|u| u["status"].clone())
                .unwrap()
        };
        assert_eq!(status_of("ann@x.io"), "active");
        assert_eq!(status_of("bob@x.io"), "offline");
        assert_eq!(status_of("root@x.io"), "offline");
    }

    #[tokio::test]
    async fn test_stats_dashboard() {
        let api = Arc::new(admin_api());
        let (status, body) =
            send(app(api), "GET", "/api/admin/stats", Some(&admin_token()), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["totals"]["blogs"], 2);
        assert_eq!(body["totals"]["users"], 3);
        assert_eq!(body["totals"]["messages"], 2);
        assert_eq!(body["postsPerMonth"].as_array().unwrap().len(), 6);
        assert_eq!(body["topAuthors"][0]["posts"], 2);
    }

    #[tokio::test]
    async fn test_forged_admin_token_is_rejected_after_cache_is_warm() {
        let admin = admin_token();
        let api = Arc::new(admin_api().accepting(&[admin.as_str()]));
        let router = app(api.clone());

        let (status, body) =
            send(router.clone(), "GET", "/api/admin/users", Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 3);
        let warm_calls = api.user_calls.load(Ordering::SeqCst);

        let forged = token_signed_with("adm", "root@x.io", "Root", b"attacker");
        for uri in ["/api/admin/users", "/api/admin/stats", "/api/admin/messages"] {
            let (status, body) = send(router.clone(), "GET", uri, Some(&forged), None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert!(body.get("error").is_some(), "{}", uri);
        }
        // Every forged attempt reached upstream instead of a cached answer.
        assert_eq!(api.user_calls.load(Ordering::SeqCst), warm_calls + 3);
    }

    #[tokio::test]
    async fn test_admin_lookup_is_cached_per_token() {
        let admin = admin_token();
        let api = Arc::new(admin_api());
        let router = app(api.clone());

        for _ in 0..3 {
            let (status, _) =
                send(router.clone(), "GET", "/api/admin/users", Some(&admin), None).await;
            assert_eq!(status, StatusCode::OK);
        }
        assert_eq!(api.user_calls.load(Ordering::SeqCst), 1);

        let other = token_for("u1", "ann@x.io", "Ann");
        let (status, _) = send(router, "GET", "/api/admin/users", Some(&other), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(api.user_calls.load(Ordering::SeqCst), 2);
    }
}
