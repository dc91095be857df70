//! Signed audit-trail (MBOM) generation and verification for SentinelDF
//! (spec §3 "MBOM", §4.I "MBOM Signer & Verifier").
//!
//! An MBOM binds a batch's scan results, summary, and approver identity
//! under an HMAC-SHA256 signature computed over a canonical JSON
//! encoding, so any downstream consumer can detect tampering without
//! trusting the transport that delivered the record.

mod canonical_json;
mod error;
mod sign;
mod types;
mod verify;

pub use canonical_json::canonical_json_bytes;
pub use error::MbomError;
pub use sign::sign;
pub use types::{Mbom, VerifyOutcome};
pub use verify::verify;
