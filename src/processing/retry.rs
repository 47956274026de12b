//! Bounded exponential backoff around provider calls.

use std::future::Future;
use std::time::Duration;

use crate::metrics::PipelineMetrics;
use crate::summarization::SummarizationClientError;

use super::types::ProcessingError;

const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Attempt budget and backoff unit applied to every external call.
///
/// Retry `n` (zero-based) waits `unit * 2^n`, so the default policy waits 1s, 2s, 4s, and 8s
/// between its five attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, Duration::from_secs(1))
    }
}

impl RetryPolicy {
    /// Build a policy; an attempt budget of zero is raised to one.
    pub fn new(max_attempts: u32, unit: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            unit,
        }
    }

    /// Total calls allowed, the first one included.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay inserted before retry number `retry_index` (zero-based).
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        let factor = 1u32.checked_shl(retry_index).unwrap_or(u32::MAX);
        self.unit.saturating_mul(factor)
    }

    /// Run `call` until it succeeds or the attempt budget is spent.
    ///
    /// Every failure is logged before the next attempt or before the error is returned.
    pub async fn run<F, Fut>(
        &self,
        label: &str,
        metrics: &PipelineMetrics,
        mut call: F,
    ) -> Result<String, ProcessingError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, SummarizationClientError>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            tracing::debug!(stage = label, attempt, "Requesting summary");
            match call().await {
                Ok(summary) => {
                    metrics.record_attempt(false);
                    return Ok(summary);
                }
                Err(error) => {
                    metrics.record_attempt(true);
                    if attempt >= self.max_attempts {
                        tracing::error!(
                            stage = label,
                            attempt,
                            error = %error,
                            "Summary attempts exhausted"
                        );
                        return Err(ProcessingError::RetriesExhausted {
                            attempts: attempt,
                            source: error,
                        });
                    }
                    let delay = self.delay_for(attempt - 1);
                    tracing::warn!(
                        stage = label,
                        attempt,
                        retry_in_ms = delay.as_millis() as u64,
                        error = %error,
                        "Summary request failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
