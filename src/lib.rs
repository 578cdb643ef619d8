//! Blog Portal - backend-for-frontend for the blog platform.
//!
//! Sits between the browser and the blog REST API: ranks, filters and pages
//! listings, enforces who may edit what, and serves the admin dashboard.

pub mod api;
pub mod config;
pub mod error;
pub mod listing;
pub mod logging;
pub mod models;
pub mod routes;
pub mod session;
pub mod stats;
pub mod store;

use anyhow::Context;
use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{delete, get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::api::RestBlogApi;
use crate::config::AppConfig;
use crate::store::BlogStore;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: BlogStore,
}

impl AppState {
    pub fn new(config: AppConfig, store: BlogStore) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }
}

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN, falling back to
/// the local dev server.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                HeaderValue::from_static("http://localhost:5173"),
                HeaderValue::from_static("http://127.0.0.1:5173"),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Routes without the outer middleware stack.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/logs", post(routes::logs::receive_client_logs))
        .route("/api/blogs/trending", get(routes::blogs::trending))
        .route("/api/blogs/categories", get(routes::blogs::categories))
        .route("/api/blogs/mine", get(routes::blogs::my_blogs))
        .route(
            "/api/blogs",
            get(routes::blogs::list_blogs).post(routes::blogs::create_blog),
        )
        .route(
            "/api/blogs/{id}",
            get(routes::blogs::get_blog)
                .patch(routes::blogs::update_blog)
                .delete(routes::blogs::delete_blog),
        )
        .route("/api/blogs/{id}/like", post(routes::blogs::like_blog))
        .route("/api/blogs/{id}/reviews", post(routes::reviews::add_review))
        .route(
            "/api/blogs/{id}/reviews/{review_id}",
            delete(routes::reviews::delete_review),
        )
        .route("/api/contact", post(routes::contact::submit_message))
        .route("/api/admin/messages", get(routes::admin::list_messages))
        .route(
            "/api/admin/messages/{id}",
            delete(routes::admin::delete_message),
        )
        .route("/api/admin/users", get(routes::admin::list_users))
        .route("/api/admin/stats", get(routes::admin::stats))
        .route(
            "/api/preferences/theme",
            get(routes::preferences::get_theme).put(routes::preferences::set_theme),
        )
        .route("/rss.xml", get(routes::rss::rss_feed))
        .route("/health", get(routes::health::health_ping))
        .route("/health/detailed", get(routes::health::health_detailed))
        .route("/health/upstream", get(routes::health::health_upstream))
        .route("/health/ready", get(routes::health::health_ready))
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors();
    tracing::info!("CORS configured");

    api_router()
        .with_state(state)
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // Blog bodies are rich text; 2 MB is plenty.
        .layer(RequestBodyLimitLayer::new(2 * 1024 * 1024))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;

    let _log_guards = logging::init();

    routes::health::init_start_time();

    let api = RestBlogApi::new(&config.api).context("Failed to create blog API client")?;
    tracing::info!(base_url = %api.base_url(), "Blog API client ready");

    let store = BlogStore::new(Arc::new(api), &config.cache);
    let addr: SocketAddr = config
        .bind_addr()
        .parse()
        .context("Invalid SERVER__HOST/SERVER__PORT configuration")?;

    let app = create_app(AppState::new(config, store));

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
