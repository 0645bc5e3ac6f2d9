//! Axum server wiring for the explanation service.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::cache::ExplanationCache;
use crate::config::ServerConfig;

/// Shared state for all API handlers.
#[derive(Clone)]
pub struct AppState {
    /// Content-addressed explanation cache owning the completion provider.
    pub cache: Arc<ExplanationCache>,
}

impl AppState {
    pub fn new(cache: Arc<ExplanationCache>) -> Self {
        Self { cache }
    }
}

/// Build the axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    let shared_state = Arc::new(state);

    // The service is called from arbitrary frontends; any origin is allowed.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/upload", post(super::routes::upload::upload_and_explain))
        .route("/health", get(super::routes::health::get_health))
        // Body size limit: 10 MiB — generous for any source file, and
        // rejects oversized payloads before multipart parsing starts.
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(shared_state)
}

/// Start the API server.
pub async fn start_server(
    config: &ServerConfig,
    state: AppState,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = build_router(state);
    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("explanation service listening on {addr}");
    axum::serve(listener, app).await?;
    Ok(())
}
