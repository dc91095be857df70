use chrono::Utc;
use hmac::{Hmac, Mac};
use pipeline::BatchResult;
use sha2::{Digest, Sha256};

use crate::canonical_json::canonical_json_bytes;
use crate::error::MbomError;
use crate::types::{Mbom, SignedPayload};

type HmacSha256 = Hmac<Sha256>;

/// Sign a batch result (spec §4.I). `results_hash = sha256(canonical_json(
/// results))`; the signed payload is the canonical JSON of `{mbom_id,
/// batch_id, approved_by, timestamp, summary, results_hash}`;
/// `signature = hex(hmac_sha256(secret, signed_payload))`.
pub fn sign(batch: &BatchResult, approved_by: &str, secret: &[u8]) -> Result<Mbom, MbomError> {
    let mbom_id = uuid::Uuid::new_v4().to_string();
    let timestamp = Utc::now();
    let results_hash = hex::encode(Sha256::digest(canonical_json_bytes(&batch.results)?));

    let payload = SignedPayload {
        mbom_id: &mbom_id,
        batch_id: &batch.batch_id,
        approved_by,
        timestamp,
        summary: &batch.summary,
        results_hash: &results_hash,
    };
    let signed_bytes = canonical_json_bytes(&payload)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(&signed_bytes);
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(Mbom {
        mbom_id,
        batch_id: batch.batch_id.clone(),
        approved_by: approved_by.to_string(),
        timestamp,
        summary: batch.summary,
        results_hash,
        signature,
        results: batch.results.clone(),
    })
}

#[cfg(test)]
mod tests {
    use pipeline::{BatchSummary, ScanResult, SignalBreakdown};

    use super::*;

    fn sample_batch() -> BatchResult {
        let result = ScanResult {
            doc_id: "d1".to_string(),
            risk: 10,
            quarantine: false,
            action: "allow".to_string(),
            reasons: vec![],
            confidence: 0.6,
            spans: vec![],
            signals: SignalBreakdown { heuristic: 0.1, embedding: 0.1, unicode: 0.0, compression_bomb: false, homoglyphs: false },
            timestamp: Utc::now(),
        };
        BatchResult {
            batch_id: "batch-1".to_string(),
            summary: BatchSummary::compute(std::slice::from_ref(&result)),
            results: vec![result],
        }
    }

    #[test]
    fn sign_produces_matching_batch_id() {
        let batch = sample_batch();
        let mbom = sign(&batch, "alice@example.com", b"topsecret").unwrap();
        assert_eq!(mbom.batch_id, "batch-1");
        assert_eq!(mbom.approved_by, "alice@example.com");
        assert!(!mbom.signature.is_empty());
    }

    #[test]
    fn signing_twice_yields_different_mbom_ids() {
        let batch = sample_batch();
        let a = sign(&batch, "alice", b"secret").unwrap();
        let b = sign(&batch, "alice", b"secret").unwrap();
        assert_ne!(a.mbom_id, b.mbom_id);
        assert_eq!(a.results_hash, b.results_hash);
    }
}
