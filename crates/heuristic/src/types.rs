use serde::{Deserialize, Serialize};

/// Severity bucket attached to a [`Span`]. Ordering matters for sorting and
/// for deciding which severity wins when spans are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A byte-offset range into the *original* (raw, not canonical) content that
/// a signal class wants to highlight, plus the reason it was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub severity: Severity,
    pub reason: String,
}

/// Output of the heuristic detector (spec §4.B) or the Unicode sub-detector
/// (spec §4.B.1). Both produce the same shape; the Unicode analyzer just
/// never needs `detector_version` bumped independently of its parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalResult {
    pub score: f64,
    pub reasons: Vec<String>,
    pub spans: Vec<Span>,
    pub features: std::collections::BTreeMap<String, FeatureValue>,
    pub detector_version: &'static str,
}

/// Feature values surfaced alongside a signal. Kept as a small closed enum
/// rather than `serde_json::Value` since the heuristic/unicode detectors only
/// ever emit booleans and counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Bool(bool),
    Count(u64),
    Float(f64),
}

/// Merge overlapping spans that carry the *same* reason into one, then sort
/// by `start`. Spans with different reasons are kept distinct even if they
/// overlap (spec §4.B: "Overlapping spans with identical reason are merged").
pub fn merge_and_sort_spans(mut spans: Vec<Span>) -> Vec<Span> {
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(a.reason.cmp(&b.reason)));
    let mut merged: Vec<Span> = Vec::with_capacity(spans.len());
    for span in spans {
        if let Some(last) = merged.last_mut() {
            if last.reason == span.reason && span.start <= last.end {
                last.end = last.end.max(span.end);
                continue;
            }
        }
        merged.push(span);
    }
    merged.sort_by_key(|s| s.start);
    merged
}
