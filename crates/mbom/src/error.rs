use thiserror::Error;

/// Errors produced while signing or verifying an MBOM (spec §4.I).
#[derive(Debug, Error)]
pub enum MbomError {
    #[error("failed to canonicalize for signing: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("no stored batch result for batch_id {0}")]
    BatchNotFound(String),
}
