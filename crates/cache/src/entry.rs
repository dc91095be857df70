use serde::{Deserialize, Serialize};

use heuristic::SignalResult;

/// Stored value in the embeddings namespace. Entries are immutable once
/// written (spec §3 lifecycle: "Cache Entry is created on first-miss and
/// never updated").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingEntry {
    pub vector: Vec<f32>,
    pub created_at_unix_ms: i64,
}

/// Stored value in the heuristics namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicEntry {
    pub signal: SignalResult,
    pub created_at_unix_ms: i64,
}
