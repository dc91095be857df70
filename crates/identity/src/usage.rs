//! Usage Recorder (spec §4.H). Grounded on the bounded-mpsc-channel plus
//! background-drainer pattern implied by the teacher's async-everywhere
//! architecture, and on `aidetector`'s `db::insert_analysis_full` (an async
//! insert issued from the request handler without blocking the HTTP
//! response).

use tokio::sync::mpsc;

use crate::models::UsageRecord;
use crate::store::Store;

/// Handle given to request handlers. `record` never awaits the durable
/// store — delivery is at-least-once; a crash can drop the most recently
/// buffered rows (spec §4.H "acceptable for billing because monthly
/// rollups are replayed from the authoritative store").
#[derive(Clone)]
pub struct UsageRecorder {
    sender: mpsc::Sender<UsageRecord>,
}

impl UsageRecorder {
    /// Spawn the background drainer. `capacity` is `usage_buffer_capacity`
    /// (spec §6).
    pub fn spawn(store: Store, capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        tokio::spawn(drain(store, receiver));
        Self { sender }
    }

    /// Record one call's usage metering row. Non-blocking with respect to
    /// the HTTP response (spec §4.H contract). Under back-pressure, the
    /// *least critical field* (`response_time_ms`) is dropped first before
    /// the record itself is ever dropped (spec §5): a full channel gets one
    /// retry with that field cleared.
    pub fn record(&self, record: UsageRecord) {
        match self.sender.try_send(record) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(mut record)) => {
                record.response_time_ms = None;
                if self.sender.try_send(record).is_err() {
                    tracing::warn!("usage buffer saturated, dropping usage record");
                }
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::error!("usage recorder drainer task is gone, dropping usage record");
            }
        }
    }
}

async fn drain(store: Store, mut receiver: mpsc::Receiver<UsageRecord>) {
    while let Some(record) = receiver.recv().await {
        if let Err(err) = store.insert_usage_record(&record).await {
            tracing::warn!(error = %err, "failed to persist usage record");
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    async fn test_store() -> Store {
        Store::connect("sqlite::memory:").await.unwrap()
    }

    fn sample_record(user_id: &str) -> UsageRecord {
        UsageRecord {
            user_id: user_id.to_string(),
            api_key_id: "key1".to_string(),
            endpoint: "/v1/scan".to_string(),
            timestamp: Utc::now(),
            documents_scanned: 3,
            tokens_used: 0,
            cost_cents: 0,
            response_time_ms: Some(42),
            status_code: 200,
        }
    }

    #[tokio::test]
    async fn recorded_usage_eventually_persists() {
        let store = test_store().await;
        let user = crate::models::UserRecord {
            id: uuid::Uuid::new_v4().to_string(),
            identity_key: "ext-1".to_string(),
            email: "dev@example.com".to_string(),
            monthly_quota: 1000,
            subscription_tier: "free".to_string(),
            created_at: Utc::now(),
        };
        store.create_user(&user).await.unwrap();

        let recorder = UsageRecorder::spawn(store.clone(), 16);
        recorder.record(sample_record(&user.id));

        // Give the background drainer a chance to run.
        for _ in 0..50 {
            let total = store.monthly_documents_scanned(&user.id, Utc::now()).await.unwrap();
            if total == 3 {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        panic!("usage record was never drained");
    }

    #[tokio::test]
    async fn full_buffer_drops_response_time_before_record() {
        let store = test_store().await;
        let recorder = UsageRecorder::spawn(store, 1);
        // Fire several records quickly; none should panic and the recorder
        // degrades gracefully under a saturated buffer.
        for _ in 0..10 {
            recorder.record(sample_record("user-x"));
        }
    }
}
