use thiserror::Error;

/// Errors produced by the identity/auth/usage crate (spec §4.G/§4.H).
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("missing or malformed Authorization header")]
    Unauthenticated,

    #[error("API key is unknown or inactive")]
    Forbidden,

    #[error("monthly quota exceeded, retry after {retry_after_secs}s")]
    QuotaExceeded { retry_after_secs: u64 },

    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("store error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}
