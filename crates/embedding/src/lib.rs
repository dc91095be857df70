//! Embedding outlier detector for SentinelDF (spec §4.C).
//!
//! Produces a deterministic 384-dimensional stub embedding (adapted from the
//! teacher's `semantic::stub::make_stub_embedding`, always run in that
//! reproducible mode — SentinelDF has no remote/ONNX tier) and scores it
//! against a fitted isolation forest, calibrated to fixed percentile anchors
//! so the risk scale is stable across deployments that fit over the same
//! seed corpus.

mod calibration;
mod forest;
mod model;
mod seed_corpus;
mod types;
mod vector;

pub use types::EmbeddingResult;
pub use vector::{make_stub_embedding, EMBEDDING_DIM};

/// Bumped whenever the seed corpus, forest hyperparameters, or calibration
/// anchors change; participates in the cache key via the `pipeline` crate.
pub const MODEL_ID: &str = "sentineldf-embedding-stub";
pub const MODEL_VERSION: &str = "embedding-v1";

/// Maximum batch size the pipeline is expected to submit at once (spec
/// §4.C). Enforced by the caller, not this crate — `score_batch` accepts any
/// length and simply preserves input order.
pub const MAX_BATCH_SIZE: usize = 128;

/// Score a single canonical text. Never fails: if embedding generation were
/// ever to become unavailable this returns the degraded result, but the
/// deterministic stub path used here cannot itself fail.
pub fn score(canonical: &str) -> EmbeddingResult {
    let vector = vector::make_stub_embedding(canonical);
    let calibrated = model::calibrated_score(&vector);
    EmbeddingResult {
        score: calibrated,
        reasons: Vec::new(),
        model_id: MODEL_ID,
        model_version: MODEL_VERSION,
    }
}

/// Score a batch of canonical texts, returning one result per input in input
/// order (spec §4.C batching contract).
pub fn score_batch(canonicals: &[String]) -> Vec<EmbeddingResult> {
    canonicals.iter().map(|c| score(c)).collect()
}

/// Recompute a calibrated score from a previously generated embedding vector
/// (e.g. one fetched back out of the persistent cache), without regenerating
/// it from the canonical text. Calibration is cheap (one forest pass), so
/// this is the only step a cache hit needs to redo.
pub fn score_from_vector(vector: &[f32]) -> f64 {
    model::calibrated_score(vector)
}

/// The degraded result returned when the embedding model cannot be loaded
/// (spec §4.C failure semantics). SentinelDF's deterministic stub path never
/// actually triggers this, but fusion and pipeline still need the shape to
/// renormalize weights when a caller chooses to treat embedding as
/// unavailable (e.g. a feature-flagged rollout).
pub fn unavailable() -> EmbeddingResult {
    EmbeddingResult {
        score: 0.0,
        reasons: vec!["embedding_unavailable".to_string()],
        model_id: MODEL_ID,
        model_version: MODEL_VERSION,
    }
}
