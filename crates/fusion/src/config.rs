use serde::{Deserialize, Serialize};

use crate::error::FusionError;

/// Fusion weights and quarantine policy (spec §4.D). Default weights
/// `(0.4, 0.6, 0.0)` fold the Unicode signal into the heuristic score via
/// its own contribution class rather than weighting it separately; setting
/// `w_u` non-zero exposes it as an independent signal instead.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FusionConfig {
    pub w_h: f64,
    pub w_e: f64,
    pub w_u: f64,
    pub quarantine_threshold: u8,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            w_h: 0.4,
            w_e: 0.6,
            w_u: 0.0,
            quarantine_threshold: 70,
        }
    }
}

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl FusionConfig {
    /// Validated at startup (spec invariant 9): weights MUST sum to 1.0
    /// within a tight floating-point tolerance, and each must be a
    /// proportion in [0, 1].
    pub fn validate(&self) -> Result<(), FusionError> {
        for (field, value) in [("w_h", self.w_h), ("w_e", self.w_e), ("w_u", self.w_u)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(FusionError::WeightOutOfRange { field, value });
            }
        }
        let sum = self.w_h + self.w_e + self.w_u;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(FusionError::WeightsDoNotSumToOne {
                w_h: self.w_h,
                w_e: self.w_e,
                w_u: self.w_u,
                sum,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        FusionConfig::default().validate().unwrap();
    }

    #[test]
    fn weights_not_summing_to_one_rejected() {
        let cfg = FusionConfig { w_h: 0.5, w_e: 0.6, w_u: 0.0, quarantine_threshold: 70 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn weight_out_of_range_rejected() {
        let cfg = FusionConfig { w_h: 1.2, w_e: -0.2, w_u: 0.0, quarantine_threshold: 70 };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn within_tolerance_accepted() {
        let cfg = FusionConfig { w_h: 0.4000001, w_e: 0.6, w_u: 0.0, quarantine_threshold: 70 };
        assert!(cfg.validate().is_ok());
    }
}
