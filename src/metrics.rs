use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing summarization activity.
#[derive(Default)]
pub struct PipelineMetrics {
    attempts: AtomicU64,
    failed_attempts: AtomicU64,
    chunks_summarized: AtomicU64,
    reduction_rounds: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one external call attempt and whether it failed.
    pub fn record_attempt(&self, failed: bool) {
        self.attempts.fetch_add(1, Ordering::Relaxed);
        if failed {
            self.failed_attempts.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a completed map round over `chunk_count` chunks.
    pub fn record_round(&self, chunk_count: u64) {
        self.reduction_rounds.fetch_add(1, Ordering::Relaxed);
        self.chunks_summarized
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            failed_attempts: self.failed_attempts.load(Ordering::Relaxed),
            chunks_summarized: self.chunks_summarized.load(Ordering::Relaxed),
            reduction_rounds: self.reduction_rounds.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// External summarization calls issued, retries included.
    pub attempts: u64,
    /// Calls that returned an error.
    pub failed_attempts: u64,
    /// Chunks summarized across all map rounds.
    pub chunks_summarized: u64,
    /// Map rounds completed before the final reduction.
    pub reduction_rounds: u64,
}
