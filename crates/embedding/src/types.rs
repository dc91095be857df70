use serde::{Deserialize, Serialize};

/// Output of the embedding outlier detector (spec §4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingResult {
    pub score: f64,
    pub reasons: Vec<String>,
    pub model_id: &'static str,
    pub model_version: &'static str,
}
