use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// spec §3 "API Key Record". Plaintext is never stored; only `key_hash`
/// (hex-encoded SHA-256) and the display-only `key_prefix` survive issuance.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ApiKeyRecord {
    pub id: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub user_id: String,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// spec §3 "User Record".
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub identity_key: String,
    pub email: String,
    pub monthly_quota: i64,
    pub subscription_tier: String,
    pub created_at: DateTime<Utc>,
}

/// spec §3 "Usage Record". Append-only once inserted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    pub user_id: String,
    pub api_key_id: String,
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
    pub documents_scanned: i64,
    pub tokens_used: i64,
    pub cost_cents: i64,
    /// Dropped first under usage-recorder back-pressure (spec §5 "least
    /// critical fields dropped first").
    pub response_time_ms: Option<i64>,
    pub status_code: i32,
}

/// Token bucket capacity/refill derived from `subscription_tier` (spec §4.G
/// "capacity and refill derived from subscription_tier").
#[derive(Debug, Clone, Copy)]
pub struct TierLimits {
    pub bucket_capacity: f64,
    pub refill_per_sec: f64,
}

impl TierLimits {
    pub fn for_tier(tier: &str) -> Self {
        match tier {
            "enterprise" => Self { bucket_capacity: 1000.0, refill_per_sec: 50.0 },
            "pro" => Self { bucket_capacity: 200.0, refill_per_sec: 10.0 },
            _ => Self { bucket_capacity: 30.0, refill_per_sec: 1.0 },
        }
    }
}
