//! Per-batch detection orchestrator for SentinelDF (spec §4.F).
//!
//! Wires the normalizer, heuristic detector, embedding outlier detector,
//! fusion, and persistent cache crates into the single entry point the
//! server calls for both `/v1/scan` (cached) and `/v1/analyze` (uncached)
//! requests: normalize each document, probe the cache, dispatch misses to
//! the right worker, fuse the three signals, and aggregate a batch summary.

mod batcher;
mod cancel;
mod config;
mod error;
mod runner;
mod types;

pub use batcher::EmbeddingBatcher;
pub use cancel::CancellationFlag;
pub use config::PipelineConfig;
pub use error::PipelineError;
pub use runner::Pipeline;
pub use types::{BatchResult, BatchSummary, Document, ScanResult, SignalBreakdown, SpanOut};
