//! Health endpoint.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::api::server::AppState;

/// GET /health — liveness plus cache counters.
pub async fn get_health(State(state): State<Arc<AppState>>) -> Json<Value> {
    let stats = state.cache.stats();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "cache": {
            "entries": stats.entries,
            "hits": stats.hits,
            "misses": stats.misses,
        },
    }))
}
