/**
 * Logs Route Handler
 * Endpoint for receiving client logs from the browser
 */

use axum::{
    extract::{Extension, Json},
    http::StatusCode,
    response::IntoResponse,
};
use tower_http::request_id::RequestId;

use crate::logging::config::{ClientLogBatch, ClientLogEntry, LogLevel, LogResponse};

/// Batches larger than this are truncated.
const MAX_BATCH: usize = 100;

/// POST /api/logs - Receive client logs
#[tracing::instrument(skip(logs), fields(batch_size = logs.logs.len()))]
pub async fn receive_client_logs(
    request_id: Option<Extension<RequestId>>,
    Json(logs): Json<ClientLogBatch>,
) -> impl IntoResponse {
    let req_id = request_id
        .as_ref()
        .and_then(|ext| ext.0.header_value().to_str().ok())
        .unwrap_or("unknown");

    tracing::info!(
        request_id = %req_id,
        batch_size = logs.logs.len(),
        "received client logs"
    );

    let mut processed = 0;
    for log in logs.logs.iter().take(MAX_BATCH) {
        if let Err(e) = process_client_log(log, req_id) {
            tracing::warn!(
                request_id = %req_id,
                error = %e,
                "failed to process client log"
            );
        } else {
            processed += 1;
        }
    }

    let response = LogResponse {
        success: true,
        received: logs.logs.len(),
        processed,
        error: None,
    };

    (StatusCode::ACCEPTED, Json(response))
}

/// Re-emit a single browser log entry at its own level
fn process_client_log(log: &ClientLogEntry, request_id: &str) -> Result<(), String> {
    if log.message.trim().is_empty() {
        return Err("empty message".to_string());
    }

    let span = tracing::info_span!(
        "client_log",
        request_id = %request_id,
        timestamp = %log.timestamp,
        page = log.page.as_deref().unwrap_or("-"),
        source = "client",
    );
    let _enter = span.enter();

    match log.level {
        LogLevel::Trace => tracing::trace!(message = %log.message, context = ?log.context, "client log"),
        LogLevel::Debug => tracing::debug!(message = %log.message, context = ?log.context, "client log"),
        LogLevel::Info => tracing::info!(message = %log.message, context = ?log.context, "client log"),
        LogLevel::Warn => tracing::warn!(message = %log.message, context = ?log.context, "client log"),
        LogLevel::Error => tracing::error!(message = %log.message, context = ?log.context, "client log"),
    }

    Ok(())
}
