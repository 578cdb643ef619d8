/**
 * Health Routes
 * Endpoints for checking backend and upstream API health
 */
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::AppState;

// Track server start time for uptime calculation
lazy_static::lazy_static! {
    static ref SERVER_START: Instant = Instant::now();
}

/// Initialize the server start time
pub fn init_start_time() {
    lazy_static::initialize(&SERVER_START);
}

/// Single service check result
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCheck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Detailed health check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedHealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthChecks {
    pub upstream: ServiceCheck,
    pub cached_entries: u64,
}

/// Ready check response
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Simple health response
#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleHealthResponse {
    pub status: String,
}

async fn check_upstream(state: &AppState) -> ServiceCheck {
    match state.store.health_check().await {
        Ok(duration) => ServiceCheck {
            status: "healthy".to_string(),
            response_time: Some(duration.as_millis() as u64),
            error: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "upstream health check failed");
            ServiceCheck {
                status: "unhealthy".to_string(),
                response_time: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// GET /health - Simple health ping
pub async fn health_ping() -> impl IntoResponse {
    Json(SimpleHealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /health/detailed - Detailed health with all checks
pub async fn health_detailed(State(state): State<AppState>) -> impl IntoResponse {
    let upstream = check_upstream(&state).await;

    // The BFF itself is up even when the upstream API is not.
    let response = DetailedHealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
        uptime: Some(SERVER_START.elapsed().as_secs()),
        checks: HealthChecks {
            upstream,
            cached_entries: state.store.cached_entries(),
        },
    };

    (StatusCode::OK, Json(response))
}

/// GET /health/upstream - Blog API reachability
pub async fn health_upstream(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(check_upstream(&state).await))
}

/// GET /health/ready - Ready once the upstream API answers
pub async fn health_ready(State(state): State<AppState>) -> impl IntoResponse {
    let upstream = check_upstream(&state).await;
    let is_ready = upstream.status == "healthy";

    let response = ReadyResponse {
        status: if is_ready {
            "ready".to_string()
        } else {
            "not ready".to_string()
        },
        timestamp: Utc::now(),
        uptime: Some(SERVER_START.elapsed().as_secs()),
        reason: upstream.error,
    };

    let status = if is_ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeBlogApi;
    use crate::routes::testing::app;
    use axum::body::Body;
    use axum::http::Request;
    use axum::Router;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, T) {
        let req = Request::get(uri).body(Body::empty()).unwrap();
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value: T = serde_json::from_slice(&body).unwrap();
        (status, value)
    }

    fn down_api() -> Arc<FakeBlogApi> {
        let api = Arc::new(FakeBlogApi::default());
        api.down.store(true, Ordering::SeqCst);
        api
    }

    #[tokio::test]
    async fn test_health_ping_returns_ok() {
        init_start_time();
        let (status, body) =
            get_json::<SimpleHealthResponse>(app(Arc::new(FakeBlogApi::default())), "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
    }

    #[tokio::test]
    async fn test_health_detailed_reports_upstream() {
        init_start_time();
        let (status, body) = get_json::<DetailedHealthResponse>(
            app(Arc::new(FakeBlogApi::default())),
            "/health/detailed",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ok");
        assert_eq!(body.checks.upstream.status, "healthy");
        assert!(body.uptime.is_some());
    }

    #[tokio::test]
    async fn test_health_detailed_ok_when_upstream_down() {
        let (status, body) = get_json::<DetailedHealthResponse>(app(down_api()), "/health/detailed").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.checks.upstream.status, "unhealthy");
        assert!(body.checks.upstream.error.is_some());
    }

    #[tokio::test]
    async fn test_health_upstream() {
        let (status, body) = get_json::<ServiceCheck>(app(down_api()), "/health/upstream").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "unhealthy");
    }

    #[tokio::test]
    async fn test_health_ready() {
        init_start_time();
        let (status, body) =
            get_json::<ReadyResponse>(app(Arc::new(FakeBlogApi::default())), "/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.status, "ready");

        let (status, body) = get_json::<ReadyResponse>(app(down_api()), "/health/ready").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.status, "not ready");
        assert!(body.reason.is_some());
    }
}
