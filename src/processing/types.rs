//! Core data types and error definitions for the summarization pipeline.

use crate::summarization::SummarizationClientError;
use thiserror::Error;

/// Errors emitted by the summarization pipeline.
///
/// Individual provider failures are retried and only logged; a run fails once a single call
/// exhausts its attempt budget.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// Every attempt allowed by the retry policy failed.
    #[error("Summarization failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Number of calls made before giving up.
        attempts: u32,
        /// Error returned by the final attempt.
        #[source]
        source: SummarizationClientError,
    },
    /// The shutdown signal fired before the final summary was produced.
    #[error("Summarization cancelled before completion")]
    Cancelled,
}

/// How far the pipeline reduces before the final summarization call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReductionMode {
    /// Summarize every chunk once, then summarize the concatenation.
    #[default]
    OnePass,
    /// Keep re-chunking the intermediate document while it still splits into several chunks,
    /// for at most `max_rounds` map rounds.
    Recursive {
        /// Upper bound on map rounds before the final call.
        max_rounds: usize,
    },
}

/// Join per-chunk summaries into the intermediate document, one summary per line.
pub fn build_intermediate_document(summaries: &[String]) -> String {
    let mut document = String::with_capacity(summaries.iter().map(|s| s.len() + 1).sum());
    for summary in summaries {
        document.push_str(summary);
        document.push('\n');
    }
    document
}
