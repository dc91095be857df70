//! HTTP route handlers for SentinelDF (spec §4.J "HTTP Surface"). Routes are
//! grouped by what they operate on:
//!
//! - `health`: liveness, readiness, Prometheus metrics, build metadata
//! - `scan`: `/v1/scan` and `/v1/analyze`
//! - `mbom`: signing and verifying MBOM audit records
//! - `keys`: API key lifecycle and usage reporting

pub mod health;
pub mod keys;
pub mod mbom;
pub mod scan;

use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::error::{ServerError, ServerResult};

/// Root endpoint (`GET /`), unauthenticated.
pub async fn api_info() -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "SentinelDF Server",
        "version": env!("CARGO_PKG_VERSION"),
        "api_version": "v1",
        "endpoints": [
            "/v1/scan",
            "/v1/analyze",
            "/v1/mbom",
            "/v1/mbom/verify",
            "/v1/keys/create",
            "/v1/keys/me",
            "/v1/keys/usage",
            "/v1/keys/{id}",
            "/health",
            "/ready",
            "/metrics"
        ]
    })))
}

/// Fallback for undefined routes.
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}
