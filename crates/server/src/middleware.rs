use std::sync::Arc;

use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use identity::AuthContext;

use crate::error::ServerError;
use crate::state::ServerState;

/// API-key authentication middleware (spec §4.G). Covers everything
/// `identity::AuthGate::authenticate` can check before the request body is
/// parsed: bearer extraction, hash lookup, active-key check, and the
/// per-key token-bucket rate limit. The quota check itself needs the
/// incoming batch size and runs later, inside the `/v1/scan` and
/// `/v1/analyze` handlers, via `AuthGate::check_quota`.
pub async fn api_key_auth(
    state: axum::extract::State<Arc<ServerState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ServerError> {
    let header = request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());

    let ctx: AuthContext = state.auth.authenticate(header).await?;
    request.extensions_mut().insert(ctx);

    Ok(next.run(request).await)
}

/// Request ID injection middleware, kept verbatim in shape from the teacher.
pub async fn request_id(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    request.extensions_mut().insert(request_id.clone());

    let mut response = next.run(request).await;
    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

/// Request/response logging middleware, kept verbatim in shape from the teacher.
pub async fn log_requests(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let request_id = request.extensions().get::<String>().cloned().unwrap_or_default();

    tracing::info!(method = %method, uri = %uri, request_id = %request_id, "request started");

    let response = next.run(request).await;
    let duration = start.elapsed();
    let status = response.status();

    tracing::info!(
        method = %method,
        uri = %uri,
        status = %status,
        duration_ms = %duration.as_millis(),
        request_id = %request_id,
        "request completed"
    );

    response
}
