use serde::{Deserialize, Serialize};

/// Pipeline-level knobs from spec §6 that are not owned by `fusion` or
/// `cache`: batch/document size limits, worker pool depth, and embedding
/// batcher timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub max_docs_per_request: usize,
    pub max_doc_bytes: usize,
    pub worker_pool_size: usize,
    pub embedding_batch_size: usize,
    pub embedding_batch_latency_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_docs_per_request: 1000,
            max_doc_bytes: 20_000,
            worker_pool_size: std::thread::available_parallelism().map(|n| n.get()).unwrap_or(4),
            embedding_batch_size: 128,
            embedding_batch_latency_ms: 50,
        }
    }
}
