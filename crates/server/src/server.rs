//! Server initialization and routing (spec §4.J).
//!
//! Wires the four route groups behind two middleware stacks: a public stack
//! (`/`, `/health`, `/ready`, `/metrics`) and an authenticated stack
//! (everything under `/v1`) gated by [`crate::middleware::api_key_auth`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::middleware::{api_key_auth, log_requests, request_id};
use crate::routes::{api_info, health, keys, mbom, not_found, scan};
use crate::state::ServerState;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Render target for `GET /metrics`. `None` before [`start_server`] installs
/// the recorder (e.g. in unit tests that build a router directly).
pub fn metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

fn install_metrics_recorder() -> anyhow::Result<()> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = METRICS_HANDLE.set(handle);
    Ok(())
}

fn build_router(state: Arc<ServerState>) -> Router {
    let cors = if state.config.enable_cors {
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    let public_routes = Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics));

    let protected_routes = Router::new()
        .route("/v1/scan", post(scan::scan))
        .route("/v1/analyze", post(scan::analyze))
        .route("/v1/mbom", post(mbom::create_mbom))
        .route("/v1/mbom/verify", post(mbom::verify_mbom))
        .route("/v1/keys/usage", get(keys::usage))
        .route("/v1/keys/create", post(keys::create_key))
        .route("/v1/keys/me", get(keys::me))
        .route("/v1/keys/{id}", delete(keys::delete_key))
        .route("/v1/metadata", get(health::server_metadata))
        .layer(from_fn_with_state(state.clone(), api_key_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .fallback(not_found)
        .layer(axum::extract::DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, state.config.timeout()))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the SentinelDF HTTP server. Blocks until shutdown via Ctrl+C or
/// SIGTERM.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    if config.metrics_enabled {
        install_metrics_recorder()?;
    }

    let addr: SocketAddr = config.socket_addr()?;
    let state = Arc::new(ServerState::new(config).await?);
    let app = build_router(state.clone());

    tracing::info!(addr = %addr, "starting sentineldf-server");
    tracing::info!(
        timeout_secs = state.config.timeout_secs,
        max_body_mb = state.config.max_body_size_mb,
        cors = state.config.enable_cors,
        metrics = state.config.metrics_enabled,
        "server configuration"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
