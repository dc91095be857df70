//! Weighted risk fusion and calibration for SentinelDF (spec §4.D).
//!
//! Combines the heuristic, embedding, and Unicode signal results into a
//! single risk score, quarantine decision, and agreement-based confidence
//! measure. Weight validation follows the same "validate the whole
//! configuration tree at startup" discipline the teacher applies to match
//! configuration.

mod config;
mod error;
mod fuse;
mod types;

pub use config::FusionConfig;
pub use error::FusionError;
pub use fuse::fuse;
pub use types::FusionResult;
