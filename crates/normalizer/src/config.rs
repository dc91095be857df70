use serde::{Deserialize, Serialize};

/// Configuration for the normalizer.
///
/// `version` participates in the canonical hash so that a behavior change
/// (e.g. a future ASCII-folding table fix) never collides with hashes
/// produced by an older version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizerConfig {
    pub version: u32,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self { version: 1 }
    }
}

impl NormalizerConfig {
    pub(crate) fn validate(&self) -> Result<(), crate::NormalizerError> {
        if self.version == 0 {
            return Err(crate::NormalizerError::InvalidConfig);
        }
        Ok(())
    }
}
