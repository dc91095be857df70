use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::canonical_json::canonical_json_bytes;
use crate::error::MbomError;
use crate::types::{Mbom, SignedPayload, VerifyOutcome};

type HmacSha256 = Hmac<Sha256>;

/// Verify that `mbom` was produced with `secret` and has not been tampered
/// with (spec §4.I / §7 scenario "tamper"). Recomputes both `results_hash`
/// and the HMAC signature from `mbom.results` and compares each in
/// constant time; any mismatch fails the whole record rather than
/// reporting which half diverged, so a forger learns nothing from the
/// verdict.
pub fn verify(mbom: &Mbom, secret: &[u8]) -> Result<VerifyOutcome, MbomError> {
    let expected_hash = hex::encode(Sha256::digest(canonical_json_bytes(&mbom.results)?));
    let hash_matches: bool = expected_hash.as_bytes().ct_eq(mbom.results_hash.as_bytes()).into();

    let payload = SignedPayload {
        mbom_id: &mbom.mbom_id,
        batch_id: &mbom.batch_id,
        approved_by: &mbom.approved_by,
        timestamp: mbom.timestamp,
        summary: &mbom.summary,
        results_hash: &mbom.results_hash,
    };
    let signed_bytes = canonical_json_bytes(&payload)?;

    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(&signed_bytes);
    let expected_signature = hex::encode(mac.finalize().into_bytes());
    let signature_matches: bool =
        expected_signature.as_bytes().ct_eq(mbom.signature.as_bytes()).into();

    if hash_matches && signature_matches {
        Ok(VerifyOutcome { valid: true, reason: None })
    } else if !hash_matches {
        Ok(VerifyOutcome { valid: false, reason: Some("results_hash mismatch: results have been tampered with".to_string()) })
    } else {
        Ok(VerifyOutcome { valid: false, reason: Some("signature mismatch: record has been tampered with or signed with a different key".to_string()) })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pipeline::{BatchResult, BatchSummary, ScanResult, SignalBreakdown};

    use super::*;
    use crate::sign::sign;

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
    fn roundtrip_verifies_valid() {
        let batch = sample_batch();
        let mbom = sign(&batch, "alice", b"topsecret").unwrap();
        let outcome = verify(&mbom, b"topsecret").unwrap();
        assert_eq!(outcome, VerifyOutcome { valid: true, reason: None });
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let batch = sample_batch();
        let mbom = sign(&batch, "alice", b"topsecret").unwrap();
        let outcome = verify(&mbom, b"wrong-secret").unwrap();
        assert!(!outcome.valid);
    }

    #[test]
    fn tampered_results_are_rejected() {
        let batch = sample_batch();
        let mut mbom = sign(&batch, "alice", b"topsecret").unwrap();
        mbom.results[0].risk = 99;
        let outcome = verify(&mbom, b"topsecret").unwrap();
        assert!(!outcome.valid);
        assert!(outcome.reason.unwrap().contains("results_hash"));
    }

    #[test]
    fn tampered_approver_is_rejected() {
        let batch = sample_batch();
        let mut mbom = sign(&batch, "alice", b"topsecret").unwrap();
        mbom.approved_by = "mallory".to_string();
        let outcome = verify(&mbom, b"topsecret").unwrap();
        assert!(!outcome.valid);
        assert!(outcome.reason.unwrap().contains("signature"));
    }
}
