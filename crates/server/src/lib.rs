//! SentinelDF Server — the multi-tenant HTTP API gateway (spec §4.J).
//!
//! Wires the detection pipeline, persistent cache, identity/quota store,
//! and MBOM signer into a single axum service:
//!
//! - **Detection**: `POST /v1/scan` (cached) and `POST /v1/analyze` (uncached)
//! - **Audit trail**: `POST /v1/mbom`, `POST /v1/mbom/verify`
//! - **Key lifecycle**: `POST /v1/keys/create`, `GET /v1/keys/me`,
//!   `GET /v1/keys/usage`, `DELETE /v1/keys/{id}`
//! - **Operations**: `GET /health`, `GET /ready`, `GET /metrics`
//!
//! ```rust,no_run
//! use server::ServerConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::load()?;
//!     server::start_server(config).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use server::start_server;
pub use state::ServerState;
