use thiserror::Error;

/// Errors produced by the persistent cache.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache entry corrupt or undecodable: {0}")]
    Corrupt(String),
    #[error("failed to serialize cache entry: {0}")]
    Serialization(String),
}
