use std::net::SocketAddr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Server configuration (spec §6 "Environment configuration (enumerated)").
/// Loaded once at startup from an optional `server.toml`/`server.yaml` file
/// plus `SENTINELDF_SERVER__*` environment overrides; unknown keys fail
/// startup rather than being silently ignored (spec §7 "Dynamic typing &
/// duck-typed config").
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_body_size_mb")]
    pub max_body_size_mb: usize,

    /// Quarantine threshold and signal weights (spec §4.D / §6). Folded
    /// into a [`fusion::FusionConfig`] by [`ServerConfig::fusion_config`].
    #[serde(default = "default_quarantine_threshold")]
    pub quarantine_threshold: u8,
    #[serde(default = "default_heuristic_weight")]
    pub heuristic_weight: f64,
    #[serde(default = "default_embedding_weight")]
    pub embedding_weight: f64,

    /// HMAC secret for MBOM signing (spec §6 `hmac_secret`, required — no
    /// default, startup fails if absent).
    pub hmac_secret: String,

    /// Path to the persistent content-addressed cache (spec §4.E).
    #[serde(default = "default_cache_path")]
    pub cache_path: String,
    /// Must match [`cache::CURRENT_SCHEMA_VERSION`]; validated at startup
    /// rather than used to pick a schema at runtime, since the on-disk
    /// encoding is pinned by the cache crate itself (spec §6
    /// `cache_schema_version`).
    #[serde(default = "default_cache_schema_version")]
    pub cache_schema_version: u32,
    /// Must match [`heuristic::DETECTOR_VERSION`] (spec §6 `detector_version`).
    #[serde(default = "default_detector_version")]
    pub detector_version: String,
    /// Must match [`embedding::MODEL_ID`] (spec §6 `embedding_model_id`).
    #[serde(default = "default_embedding_model_id")]
    pub embedding_model_id: String,
    /// Must match [`embedding::MODEL_VERSION`] (spec §6 `embedding_model_version`).
    #[serde(default = "default_embedding_model_version")]
    pub embedding_model_version: String,

    #[serde(default = "default_max_docs_per_request")]
    pub max_docs_per_request: usize,
    #[serde(default = "default_max_doc_bytes")]
    pub max_doc_bytes: usize,
    #[serde(default = "default_worker_pool_size")]
    pub worker_pool_size: usize,
    #[serde(default = "default_embedding_batch_size")]
    pub embedding_batch_size: usize,
    #[serde(default = "default_embedding_batch_latency_ms")]
    pub embedding_batch_latency_ms: u64,

    /// Fallback token-bucket defaults; `identity::TierLimits` derives the
    /// actual per-request limits from the caller's `subscription_tier`, so
    /// these two fields are validated for presence but otherwise only size
    /// the lowest (`free`) tier bucket.
    #[serde(default = "default_rate_limit_bucket_capacity")]
    pub rate_limit_bucket_capacity: f64,
    #[serde(default = "default_rate_limit_refill_per_sec")]
    pub rate_limit_refill_per_sec: f64,

    #[serde(default = "default_usage_buffer_capacity")]
    pub usage_buffer_capacity: usize,

    /// `sqlx` connection URL for the identity/usage store (spec §6
    /// "Persistent store (identity & usage)").
    #[serde(default = "default_identity_db_url")]
    pub identity_db_url: String,

    #[serde(default = "default_true")]
    pub enable_cors: bool,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl ServerConfig {
    /// Load configuration from an optional file plus environment overrides
    /// (spec §6). `hmac_secret` has no default; its absence fails startup.
    pub fn load() -> anyhow::Result<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("server").required(false))
            .add_source(config::Environment::with_prefix("SENTINELDF_SERVER").separator("__"));

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate_pinned_versions()?;
        Ok(config)
    }

    /// Reject configs whose declared component versions don't match the
    /// compiled-in constants — these fields exist so a deployment manifest
    /// documents what it expects to run, not so the server can be
    /// retargeted at a different cache/detector/model version without a
    /// rebuild (cache hits and misses must yield equal Scan Results under
    /// identical detector versions).
    fn validate_pinned_versions(&self) -> ServerResult<()> {
        if self.cache_schema_version != cache::CURRENT_SCHEMA_VERSION {
            return Err(ServerError::Config(format!(
                "configured cache_schema_version {} does not match compiled schema version {}",
                self.cache_schema_version,
                cache::CURRENT_SCHEMA_VERSION
            )));
        }
        if self.detector_version != heuristic::DETECTOR_VERSION {
            return Err(ServerError::Config(format!(
                "configured detector_version {:?} does not match compiled detector version {:?}",
                self.detector_version,
                heuristic::DETECTOR_VERSION
            )));
        }
        if self.embedding_model_id != embedding::MODEL_ID || self.embedding_model_version != embedding::MODEL_VERSION {
            return Err(ServerError::Config(format!(
                "configured embedding model {:?}/{:?} does not match compiled model {:?}/{:?}",
                self.embedding_model_id, self.embedding_model_version, embedding::MODEL_ID, embedding::MODEL_VERSION
            )));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        let addr_str = format!("{}:{}", self.bind_addr, self.port);
        addr_str.parse().map_err(ServerError::from)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn max_body_size(&self) -> usize {
        self.max_body_size_mb * 1024 * 1024
    }

    /// Weight-sanity-validated fusion configuration (spec invariant 9).
    pub fn fusion_config(&self) -> ServerResult<fusion::FusionConfig> {
        let cfg = fusion::FusionConfig {
            w_h: self.heuristic_weight,
            w_e: self.embedding_weight,
            w_u: 0.0,
            quarantine_threshold: self.quarantine_threshold,
        };
        cfg.validate().map_err(|e| ServerError::Config(e.to_string()))?;
        Ok(cfg)
    }

    pub fn pipeline_config(&self) -> pipeline::PipelineConfig {
        pipeline::PipelineConfig {
            max_docs_per_request: self.max_docs_per_request,
            max_doc_bytes: self.max_doc_bytes,
            worker_pool_size: self.worker_pool_size,
            embedding_batch_size: self.embedding_batch_size,
            embedding_batch_latency_ms: self.embedding_batch_latency_ms,
        }
    }
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_max_body_size_mb() -> usize {
    10
}
fn default_quarantine_threshold() -> u8 {
    70
}
fn default_heuristic_weight() -> f64 {
    0.4
}
fn default_embedding_weight() -> f64 {
    0.6
}
fn default_cache_path() -> String {
    "sentineldf-cache.redb".to_string()
}
fn default_cache_schema_version() -> u32 {
    cache::CURRENT_SCHEMA_VERSION
}
fn default_detector_version() -> String {
    heuristic::DETECTOR_VERSION.to_string()
}
fn default_embedding_model_id() -> String {
    embedding::MODEL_ID.to_string()
}
fn default_embedding_model_version() -> String {
    embedding::MODEL_VERSION.to_string()
}
fn default_max_docs_per_request() -> usize {
    1000
}
fn default_max_doc_bytes() -> usize {
    20_000
}
fn default_worker_pool_size() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4)
}
fn default_embedding_batch_size() -> usize {
    128
}
fn default_embedding_batch_latency_ms() -> u64 {
    50
}
fn default_rate_limit_bucket_capacity() -> f64 {
    30.0
}
fn default_rate_limit_refill_per_sec() -> f64 {
    1.0
}
fn default_usage_buffer_capacity() -> usize {
    1024
}
fn default_identity_db_url() -> String {
    "sqlite://sentineldf-identity.db".to_string()
}
fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ServerConfig {
        ServerConfig {
            bind_addr: default_bind_addr(),
            port: default_port(),
            timeout_secs: default_timeout_secs(),
            max_body_size_mb: default_max_body_size_mb(),
            quarantine_threshold: default_quarantine_threshold(),
            heuristic_weight: default_heuristic_weight(),
            embedding_weight: default_embedding_weight(),
            hmac_secret: "test-secret".to_string(),
            cache_path: default_cache_path(),
            cache_schema_version: default_cache_schema_version(),
            detector_version: default_detector_version(),
            embedding_model_id: default_embedding_model_id(),
            embedding_model_version: default_embedding_model_version(),
            max_docs_per_request: default_max_docs_per_request(),
            max_doc_bytes: default_max_doc_bytes(),
            worker_pool_size: default_worker_pool_size(),
            embedding_batch_size: default_embedding_batch_size(),
            embedding_batch_latency_ms: default_embedding_batch_latency_ms(),
            rate_limit_bucket_capacity: default_rate_limit_bucket_capacity(),
            rate_limit_refill_per_sec: default_rate_limit_refill_per_sec(),
            usage_buffer_capacity: default_usage_buffer_capacity(),
            identity_db_url: default_identity_db_url(),
            enable_cors: true,
            log_level: default_log_level(),
            metrics_enabled: true,
        }
    }

    #[test]
    fn default_like_config_validates() {
        let cfg = sample();
        assert!(cfg.validate_pinned_versions().is_ok());
        assert!(cfg.fusion_config().is_ok());
    }

    #[test]
    fn socket_addr_parses() {
        let cfg = sample();
        let addr = cfg.socket_addr().unwrap();
        assert_eq!(addr.port(), 8080);
    }

    #[test]
    fn mismatched_detector_version_rejected() {
        let mut cfg = sample();
        cfg.detector_version = "heuristic-v0".to_string();
        assert!(cfg.validate_pinned_versions().is_err());
    }

    #[test]
    fn bad_weights_rejected_by_fusion_config() {
        let mut cfg = sample();
        cfg.heuristic_weight = 0.9;
        assert!(cfg.fusion_config().is_err());
    }
}
