use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single document submitted for scanning (spec §3 Document (input)).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Client-supplied identifier; assigned a generated one if absent.
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
}

/// A reported suspect span, resolved against the *raw* document content
/// (spec §3 Signal Result: `spans: sequence of (start, end, text, reason,
/// severity)`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpanOut {
    pub start: usize,
    pub end: usize,
    pub text: String,
    pub reason: String,
    pub severity: heuristic::Severity,
}

/// Per-signal breakdown attached to a [`ScanResult`] (spec §3 Scan Result
/// `signals` field).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SignalBreakdown {
    pub heuristic: f64,
    pub embedding: f64,
    pub unicode: f64,
    pub compression_bomb: bool,
    pub homoglyphs: bool,
}

/// Per-document output of a scan (spec §3 Scan Result).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub doc_id: String,
    pub risk: u8,
    pub quarantine: bool,
    pub action: String,
    pub reasons: Vec<String>,
    pub confidence: f64,
    pub spans: Vec<SpanOut>,
    pub signals: SignalBreakdown,
    pub timestamp: DateTime<Utc>,
}

/// Aggregate statistics over a batch (spec §3 Batch Result `summary`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct BatchSummary {
    pub total_docs: usize,
    pub quarantined_count: usize,
    pub allowed_count: usize,
    pub avg_risk: f64,
    pub max_risk: u8,
    pub p95_risk: u8,
}

impl BatchSummary {
    pub fn compute(results: &[ScanResult]) -> Self {
        if results.is_empty() {
            return Self::default();
        }
        let total_docs = results.len();
        let quarantined_count = results.iter().filter(|r| r.quarantine).count();
        let allowed_count = total_docs - quarantined_count;
        let sum: u64 = results.iter().map(|r| r.risk as u64).sum();
        let avg_risk = sum as f64 / total_docs as f64;
        let max_risk = results.iter().map(|r| r.risk).max().unwrap_or(0);

        let mut sorted_risks: Vec<u8> = results.iter().map(|r| r.risk).collect();
        sorted_risks.sort_unstable();
        let p95_idx = (((sorted_risks.len() as f64) * 0.95).ceil() as usize)
            .saturating_sub(1)
            .min(sorted_risks.len() - 1);
        let p95_risk = sorted_risks[p95_idx];

        Self { total_docs, quarantined_count, allowed_count, avg_risk, max_risk, p95_risk }
    }
}

/// Full output of `run_batch` (spec §3 Batch Result).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub results: Vec<ScanResult>,
    pub summary: BatchSummary,
}
