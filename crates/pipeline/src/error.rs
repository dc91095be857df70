use thiserror::Error;

/// Errors produced by the request pipeline (spec §4.F).
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("batch of {0} documents exceeds the configured maximum of {1}")]
    BatchTooLarge(usize, usize),

    #[error("document content of {0} bytes exceeds the configured maximum of {1}")]
    DocumentTooLarge(usize, usize),

    #[error("document content is empty")]
    EmptyDocument,

    #[error("worker pool saturated, request rejected")]
    Busy,

    #[error("batch cancelled before aggregation")]
    Cancelled,

    #[error("normalization failed: {0}")]
    Normalization(#[from] normalizer::NormalizerError),

    #[error("cache error: {0}")]
    Cache(#[from] cache::CacheError),

    #[error("detector task panicked: {0}")]
    TaskPanic(String),
}
