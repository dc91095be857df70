use std::sync::Arc;
use std::time::SystemTime;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::ServerResult;
use crate::state::{ServerMetadata, ServerState};

static SERVER_START_TIME: once_cell::sync::Lazy<SystemTime> = once_cell::sync::Lazy::new(SystemTime::now);

fn uptime_seconds() -> u64 {
    SERVER_START_TIME.elapsed().map(|d| d.as_secs()).unwrap_or(0)
}

/// Liveness probe. No auth, no dependency checks.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "sentineldf-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
    }))
}

/// Readiness probe: confirms the cache and identity store are reachable
/// through the already-built [`ServerState`] rather than re-opening them.
pub async fn readiness_check(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let cache_stats = state.pipeline.cache_stats();

    Ok(Json(json!({
        "status": "ready",
        "service": "sentineldf-server",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_seconds": uptime_seconds(),
        "components": {
            "api": "ready",
            "cache": {
                "hits": cache_stats.hits,
                "misses": cache_stats.misses,
                "hit_rate": cache_stats.hit_rate,
            },
        }
    })))
}

/// Prometheus text-format scrape endpoint. Renders whatever
/// [`crate::server::install_metrics_recorder`] installed at startup.
pub async fn metrics() -> String {
    crate::server::metrics_handle().map(|h| h.render()).unwrap_or_default()
}

/// Authenticated server metadata (build version, uptime).
pub async fn server_metadata(State(_state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    let metadata = ServerMetadata { version: env!("CARGO_PKG_VERSION").to_string(), uptime_seconds: uptime_seconds() };
    Ok(Json(serde_json::to_value(metadata)?))
}
