use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation signal (spec §4.F/§5): in-flight detector work
/// may run to completion so already-computed cache writes still commit, but
/// the aggregated result is discarded if cancellation is observed before
/// aggregation. Implemented as a plain `Arc<AtomicBool>` rather than pulling
/// in `tokio-util`'s `CancellationToken`, matching the teacher/pack's
/// preference for the smallest primitive that does the job.
#[derive(Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
