use chrono::{DateTime, Utc};
use pipeline::{BatchSummary, ScanResult};
use serde::{Deserialize, Serialize};

/// Signed audit-trail record (spec §3 MBOM). Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mbom {
    pub mbom_id: String,
    pub batch_id: String,
    pub approved_by: String,
    pub timestamp: DateTime<Utc>,
    pub summary: BatchSummary,
    pub results_hash: String,
    pub signature: String,
    pub results: Vec<ScanResult>,
}

/// The bound subset of fields the HMAC signature actually covers (spec §3
/// "signed payload"). `results` itself is not repeated here — it's bound
/// transitively through `results_hash`.
#[derive(Serialize)]
pub(crate) struct SignedPayload<'a> {
    pub mbom_id: &'a str,
    pub batch_id: &'a str,
    pub approved_by: &'a str,
    pub timestamp: DateTime<Utc>,
    pub summary: &'a BatchSummary,
    pub results_hash: &'a str,
}

/// Outcome of [`crate::verify`] (spec §4.I / §7 "tamper").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VerifyOutcome {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
