//! Durable identity & usage store (spec §6 "Persistent store (identity &
//! usage)"). Grounded on the `SqlitePool`-based async insert/query style used
//! by the pack's `aidetector` service layer — the closest real precedent in
//! this corpus for transactional rows plus async aggregation reads. Schema
//! migrations are plain versioned `.sql` files run via `sqlx::migrate!`.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use crate::error::IdentityError;
use crate::models::{ApiKeyRecord, UsageRecord, UserRecord};

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Connect to (creating if absent) the SQLite database at `url` (e.g.
    /// `sqlite://identity.db`) and run pending migrations.
    pub async fn connect(url: &str) -> Result<Self, IdentityError> {
        // A single connection avoids SQLite's single-writer contention and
        // keeps `sqlite::memory:` usable in tests (a pool would otherwise
        // hand out a fresh, empty in-memory database per connection).
        let pool = SqlitePoolOptions::new().max_connections(1).connect(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub async fn create_user(&self, user: &UserRecord) -> Result<(), IdentityError> {
        sqlx::query(
            "INSERT INTO users (id, identity_key, email, monthly_quota, subscription_tier, created_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&user.id)
        .bind(&user.identity_key)
        .bind(&user.email)
        .bind(user.monthly_quota)
        .bind(&user.subscription_tier)
        .bind(user.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserRecord>, IdentityError> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, identity_key, email, monthly_quota, subscription_tier, created_at \
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(UserRow::into_record))
    }

    pub async fn create_api_key(&self, key: &ApiKeyRecord) -> Result<(), IdentityError> {
        sqlx::query(
            "INSERT INTO api_keys (id, key_hash, key_prefix, user_id, name, is_active, created_at, last_used_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&key.id)
        .bind(&key.key_hash)
        .bind(&key.key_prefix)
        .bind(&key.user_id)
        .bind(&key.name)
        .bind(key.is_active)
        .bind(key.created_at.to_rfc3339())
        .bind(key.last_used_at.map(|t| t.to_rfc3339()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_api_key_by_hash(&self, key_hash: &str) -> Result<Option<ApiKeyRecord>, IdentityError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            "SELECT id, key_hash, key_prefix, user_id, name, is_active, created_at, last_used_at \
             FROM api_keys WHERE key_hash = ?",
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ApiKeyRow::into_record))
    }

    pub async fn get_api_key_by_id(&self, api_key_id: &str) -> Result<Option<ApiKeyRecord>, IdentityError> {
        let row = sqlx::query_as::<_, ApiKeyRow>(
            "SELECT id, key_hash, key_prefix, user_id, name, is_active, created_at, last_used_at \
             FROM api_keys WHERE id = ?",
        )
        .bind(api_key_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ApiKeyRow::into_record))
    }

    /// All keys belonging to `user_id`, most recently created first (used
    /// by `GET /v1/keys/me`).
    pub async fn list_api_keys_for_user(&self, user_id: &str) -> Result<Vec<ApiKeyRecord>, IdentityError> {
        let rows = sqlx::query_as::<_, ApiKeyRow>(
            "SELECT id, key_hash, key_prefix, user_id, name, is_active, created_at, last_used_at \
             FROM api_keys WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ApiKeyRow::into_record).collect())
    }

    /// Best-effort; a failure here must never block or fail the request
    /// (spec §4.G "Update last_used_at on the key (best effort; failures do
    /// not block the request)").
    pub async fn touch_last_used(&self, api_key_id: &str) {
        let result = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(Utc::now().to_rfc3339())
            .bind(api_key_id)
            .execute(&self.pool)
            .await;
        if let Err(err) = result {
            tracing::warn!(error = %err, api_key_id, "failed to update last_used_at");
        }
    }

    /// Revoke an API key by flipping `is_active=false` (spec §3 lifecycle:
    /// keys are never un-hashed, only deactivated).
    pub async fn deactivate_api_key(&self, api_key_id: &str) -> Result<(), IdentityError> {
        sqlx::query("UPDATE api_keys SET is_active = 0 WHERE id = ?")
            .bind(api_key_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Sum of `documents_scanned` for `user_id` within the calendar month
    /// containing `now` (spec §4.G "current-month usage sum").
    pub async fn monthly_documents_scanned(&self, user_id: &str, now: DateTime<Utc>) -> Result<i64, IdentityError> {
        let month_start = month_start(now);
        let row: (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(documents_scanned) FROM usage_records WHERE user_id = ? AND timestamp >= ?",
        )
        .bind(user_id)
        .bind(month_start.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0.unwrap_or(0))
    }

    /// Append-only insert (spec §3 Usage Record invariant: no mutation after
    /// insert). Called only by the usage recorder's background drainer.
    pub async fn insert_usage_record(&self, record: &UsageRecord) -> Result<(), IdentityError> {
        sqlx::query(
            "INSERT INTO usage_records \
             (id, user_id, api_key_id, endpoint, timestamp, documents_scanned, tokens_used, cost_cents, response_time_ms, status_code) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid::Uuid::new_v4().to_string())
        .bind(&record.user_id)
        .bind(&record.api_key_id)
        .bind(&record.endpoint)
        .bind(record.timestamp.to_rfc3339())
        .bind(record.documents_scanned)
        .bind(record.tokens_used)
        .bind(record.cost_cents)
        .bind(record.response_time_ms)
        .bind(record.status_code)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: String,
    identity_key: String,
    email: String,
    monthly_quota: i64,
    subscription_tier: String,
    created_at: String,
}

impl UserRow {
    fn into_record(self) -> UserRecord {
        UserRecord {
            id: self.id,
            identity_key: self.identity_key,
            email: self.email,
            monthly_quota: self.monthly_quota,
            subscription_tier: self.subscription_tier,
            created_at: parse_rfc3339(&self.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ApiKeyRow {
    id: String,
    key_hash: String,
    key_prefix: String,
    user_id: String,
    name: String,
    is_active: bool,
    created_at: String,
    last_used_at: Option<String>,
}

impl ApiKeyRow {
    fn into_record(self) -> ApiKeyRecord {
        ApiKeyRecord {
            id: self.id,
            key_hash: self.key_hash,
            key_prefix: self.key_prefix,
            user_id: self.user_id,
            name: self.name,
            is_active: self.is_active,
            created_at: parse_rfc3339(&self.created_at),
            last_used_at: self.last_used_at.as_deref().map(parse_rfc3339),
        }
    }
}

fn parse_rfc3339(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> Store {
        Store::connect("sqlite::memory:").await.unwrap()
    }

    fn sample_user() -> UserRecord {
        UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            identity_key: "ext-123".to_string(),
            email: "dev@example.com".to_string(),
            monthly_quota: 1000,
            subscription_tier: "free".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn user_roundtrip() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();
        let fetched = store.get_user(&user.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, user.email);
    }

    #[tokio::test]
    async fn api_key_lookup_by_hash() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();
        let key = ApiKeyRecord {
            id: uuid::Uuid::new_v4().to_string(),
            key_hash: "deadbeef".to_string(),
            key_prefix: "sk_live_demo".to_string(),
            user_id: user.id.clone(),
            name: "default".to_string(),
            is_active: true,
            created_at: Utc::now(),
            last_used_at: None,
        };
        store.create_api_key(&key).await.unwrap();
        let fetched = store.get_api_key_by_hash("deadbeef").await.unwrap().unwrap();
        assert_eq!(fetched.user_id, user.id);
        assert!(store.get_api_key_by_hash("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn usage_sum_accumulates_within_month() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();
        let now = Utc::now();
        for _ in 0..3 {
            store
                .insert_usage_record(&UsageRecord {
                    user_id: user.id.clone(),
                    api_key_id: "key1".to_string(),
                    endpoint: "/v1/scan".to_string(),
                    timestamp: now,
                    documents_scanned: 5,
                    tokens_used: 0,
                    cost_cents: 0,
                    response_time_ms: Some(12),
                    status_code: 200,
                })
                .await
                .unwrap();
        }
        let total = store.monthly_documents_scanned(&user.id, now).await.unwrap();
        assert_eq!(total, 15);
    }

    #[tokio::test]
    async fn deactivated_key_still_lookup_but_flagged_inactive() {
        let store = test_store().await;
        let user = sample_user();
        store.create_user(&user).await.unwrap();
        let key = ApiKeyRecord {
            id: "key1".to_string(),
            key_hash: "hash1".to_string(),
            key_prefix: "sk_live_demo".to_string(),
            user_id: user.id.clone(),
            name: "default".to_string(),
            is_active: true,
            created_at: Utc::now(),
            last_used_at: None,
        };
        store.create_api_key(&key).await.unwrap();
        store.deactivate_api_key("key1").await.unwrap();
        let fetched = store.get_api_key_by_hash("hash1").await.unwrap().unwrap();
        assert!(!fetched.is_active);
    }
}
