use thiserror::Error;

/// Errors produced while validating fusion configuration.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FusionError {
    #[error("fusion weights (w_h={w_h}, w_e={w_e}, w_u={w_u}) must sum to 1.0, got {sum}")]
    WeightsDoNotSumToOne { w_h: f64, w_e: f64, w_u: f64, sum: f64 },
    #[error("fusion weight {field} must be within [0, 1], got {value}")]
    WeightOutOfRange { field: &'static str, value: f64 },
    #[error("quarantine threshold must be within [0, 100], got {0}")]
    InvalidThreshold(u8),
}
