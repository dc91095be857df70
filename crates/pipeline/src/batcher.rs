//! Embedding admission queue (spec §4.F step 4, §5): coalesces pending
//! embedding work across concurrent requests, flushing at 128 items or 50ms,
//! whichever comes first. Grounded on the `tokio::sync::mpsc` +
//! `tokio::time::interval`/`timeout` admission-loop shape the teacher's
//! `semantic::rate_limit`/`circuit_breaker` modules already build on top of.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};

use embedding::EmbeddingResult;

struct BatchItem {
    canonical: String,
    reply: oneshot::Sender<EmbeddingResult>,
}

/// Handle used by pipeline workers to submit a canonical text for embedding
/// and await its scored result once the batcher flushes.
#[derive(Clone)]
pub struct EmbeddingBatcher {
    sender: mpsc::Sender<BatchItem>,
}

impl EmbeddingBatcher {
    /// Spawn the background flush loop and return a cloneable handle.
    /// `batch_size`/`latency` come from `embedding_batch_size` /
    /// `embedding_batch_latency_ms` (spec §6 configuration).
    pub fn spawn(batch_size: usize, latency: Duration) -> Self {
        let (sender, receiver) = mpsc::channel(batch_size * 4);
        tokio::spawn(flush_loop(receiver, batch_size, latency));
        Self { sender }
    }

    /// Submit a canonical text for embedding. Resolves once the batcher
    /// flushes (at `batch_size` items or `latency`, whichever first).
    pub async fn score(&self, canonical: String) -> EmbeddingResult {
        let (reply, rx) = oneshot::channel();
        if self.sender.send(BatchItem { canonical, reply }).await.is_err() {
            return embedding::unavailable();
        }
        rx.await.unwrap_or_else(|_| embedding::unavailable())
    }
}

async fn flush_loop(mut receiver: mpsc::Receiver<BatchItem>, batch_size: usize, latency: Duration) {
    let mut pending: Vec<BatchItem> = Vec::with_capacity(batch_size);
    loop {
        let first = match receiver.recv().await {
            Some(item) => item,
            None => return,
        };
        pending.push(first);

        let deadline = tokio::time::sleep(latency);
        tokio::pin!(deadline);
        while pending.len() < batch_size {
            tokio::select! {
                biased;
                item = receiver.recv() => {
                    match item {
                        Some(item) => pending.push(item),
                        None => break,
                    }
                }
                _ = &mut deadline => break,
            }
        }

        flush(&mut pending);
    }
}

fn flush(pending: &mut Vec<BatchItem>) {
    let batch = std::mem::take(pending);
    let (canonicals, replies): (Vec<String>, Vec<oneshot::Sender<EmbeddingResult>>) =
        batch.into_iter().map(|item| (item.canonical, item.reply)).unzip();
    let results = embedding::score_batch(&canonicals);
    for (reply, result) in replies.into_iter().zip(results.into_iter()) {
        let _ = reply.send(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn flushes_on_size() {
        let batcher = EmbeddingBatcher::spawn(4, Duration::from_millis(500));
        let mut handles = Vec::new();
        for i in 0..4 {
            let batcher = batcher.clone();
            handles.push(tokio::spawn(async move {
                batcher.score(format!("doc {i}")).await
            }));
        }
        for h in handles {
            let result = h.await.unwrap();
            assert!((0.0..=1.0).contains(&result.score));
        }
    }

    #[tokio::test]
    async fn flushes_on_latency() {
        let batcher = EmbeddingBatcher::spawn(128, Duration::from_millis(20));
        let result = tokio::time::timeout(Duration::from_millis(200), batcher.score("solo doc".to_string()))
            .await
            .expect("batcher should flush on latency timeout");
        assert!((0.0..=1.0).contains(&result.score));
    }
}
