use serde::{Deserialize, Serialize};

pub use heuristic::Span;

/// Final fused output of the detection pipeline (spec §4.D).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionResult {
    pub risk: u8,
    pub quarantine: bool,
    pub action: String,
    pub confidence: f64,
    pub reasons: Vec<String>,
    pub spans: Vec<Span>,
}
