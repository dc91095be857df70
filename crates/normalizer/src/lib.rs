//! NFKD content normalization and canonical hashing for SentinelDF.
//!
//! This crate turns arbitrary caller-supplied content into a
//! [`document::NormalizedForm`]: a canonical text used for hashing and
//! detection, paired with a versioned SHA-256 digest used as the cache key
//! for every downstream detector. The raw content is preserved untouched
//! (apart from invalid-UTF-8 replacement) so span offsets produced by
//! heuristic and Unicode detectors always index into what the caller
//! actually sent.
//!
//! Canonicalization: NFKD decomposition, combining-mark stripping
//! (ASCII-folding accented characters onto their base letter), lowercasing,
//! and whitespace-run collapsing. None of these mutate `raw`.

mod config;
mod document;
mod error;
mod hash;
mod pipeline;

pub use config::NormalizerConfig;
pub use document::NormalizedForm;
pub use error::NormalizerError;
pub use hash::hash_canonical_bytes;
pub use pipeline::{normalize, normalize_bytes};
