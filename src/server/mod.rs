//! HTTP surface for the export pipeline.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ExportConfig;
use crate::error::AppError;
use crate::export::ExportCoordinator;
use crate::teamtailor::{CachedSource, CandidateSource, TeamtailorClient};

pub mod handlers;

/// State shared by all handlers. Holds no per-request data.
#[derive(Clone)]
pub struct AppState {
    pub coordinator: ExportCoordinator,
    /// Present only when caching is enabled.
    pub cache: Option<Arc<CachedSource<TeamtailorClient>>>,
}

impl AppState {
    /// Wires the client (and optional cache) from configuration.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the API key is missing.
    pub fn from_config(config: &ExportConfig) -> Result<Self, AppError> {
        let client = TeamtailorClient::from_config(config)?;

        if config.cache_enabled() {
            info!("[CACHE] Enabled with TTL {}s", config.cache_ttl.as_secs());
            let cache = Arc::new(CachedSource::new(client, config.cache_ttl));
            let source: Arc<dyn CandidateSource> = cache.clone();
            Ok(Self {
                coordinator: ExportCoordinator::new(source),
                cache: Some(cache),
            })
        } else {
            Ok(Self {
                coordinator: ExportCoordinator::new(Arc::new(client)),
                cache: None,
            })
        }
    }

    /// State backed by an arbitrary source, without a cache.
    pub fn with_source(source: Arc<dyn CandidateSource>) -> Self {
        Self {
            coordinator: ExportCoordinator::new(source),
            cache: None,
        }
    }
}

/// Builds the router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/export-csv", post(handlers::export_csv))
        .route("/api/v1/cache/clear", post(handlers::clear_cache))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds `addr` and serves until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> Result<(), AppError> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Io(format!("Failed to bind {}: {}", addr, e)))?;

    info!("[HTTP] Listening on http://{}", addr);

    axum::serve(listener, build_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("[HTTP] Shutdown requested");
    }
}
