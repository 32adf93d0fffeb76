//! HTTP handlers for the export API.

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::AppError;
use crate::export::{ExportResult, ExportStatus, StatusSink};
use crate::server::AppState;
use crate::teamtailor::PageCursor;

/// Body of `POST /api/v1/export-csv`.
#[derive(Debug, Default, Deserialize)]
pub struct ExportRequest {
    /// A previous response's `links.next`, or null for the first page.
    #[serde(default)]
    pub url: Option<String>,
}

impl ExportRequest {
    /// Parses the raw body. An empty body means "first page".
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| AppError::MalformedRequest(format!("Invalid request body: {}", e)))
    }

    pub fn cursor(&self) -> Option<PageCursor> {
        self.url.as_deref().and_then(PageCursor::from_link)
    }
}

/// Logs status notifications for one HTTP export.
struct LogSink;

impl StatusSink for LogSink {
    fn notify(&self, status: ExportStatus) {
        info!("[HTTP] Export {}", status.as_str());
    }
}

pub async fn export_csv(State(state): State<AppState>, body: Bytes) -> Result<Json<ExportResult>, AppError> {
    let request = ExportRequest::from_body(&body)?;
    let cursor = request.cursor();

    let result = state.coordinator.export(cursor.as_ref(), &LogSink).await?;
    Ok(Json(result))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn clear_cache(State(state): State<AppState>) -> Json<serde_json::Value> {
    let cleared = match &state.cache {
        Some(cache) => cache.clear().await,
        None => 0,
    };
    Json(json!({ "message": "Cache cleared successfully", "cleared": cleared }))
}

pub async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Oops! Can't find the resource.")
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Upstream { .. } | AppError::MalformedResponse(_) | AppError::ConnectionFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Config(_) | AppError::Io(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        error!("[HTTP] Export failed: {}", self);

        let body = json!({
            "error": "Failed to export CSV",
            "details": self.user_message(),
        });

        (status, Json(body)).into_response()
    }
}
