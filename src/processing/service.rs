//! Pipeline coordinating chunking, per-chunk summarization, and the final reduction.

use crate::{
    config::Config,
    metrics::{MetricsSnapshot, PipelineMetrics},
    processing::{
        chunking::split_document_into_chunks,
        retry::RetryPolicy,
        types::{ProcessingError, ReductionMode, build_intermediate_document},
    },
    summarization::{SummarizationClient, SummarizationRequest},
};
use futures_util::{StreamExt, TryStreamExt, stream};
use std::{future::Future, io, sync::Arc};

/// Summarizes documents by mapping chunks through a provider and reducing the results.
///
/// The provider is injected so tests and alternative backends can stand in for the hosted
/// model. Construct the pipeline once and share it through an `Arc` if several documents are
/// processed concurrently.
pub struct SummaryPipeline {
    client: Arc<dyn SummarizationClient>,
    model: String,
    retry: RetryPolicy,
    mode: ReductionMode,
    concurrency: usize,
    metrics: Arc<PipelineMetrics>,
}

impl SummaryPipeline {
    /// Build a sequential one-pass pipeline with the default retry policy.
    pub fn new(client: Arc<dyn SummarizationClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            retry: RetryPolicy::default(),
            mode: ReductionMode::OnePass,
            concurrency: 1,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Build a pipeline using the model, retry, reduction, and concurrency settings of `config`.
    pub fn from_config(client: Arc<dyn SummarizationClient>, config: &Config) -> Self {
        Self::new(client, config.model.clone())
            .with_retry_policy(config.retry_policy())
            .with_reduction_mode(config.reduction_mode())
            .with_concurrency(config.concurrency)
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replace the reduction mode.
    pub fn with_reduction_mode(mut self, mode: ReductionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Number of chunk summaries allowed in flight at once; values below one are raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Summarize `text` into a single paragraph.
    ///
    /// Chunks are summarized in document order and their summaries joined one per line. In
    /// [`ReductionMode::OnePass`] that intermediate document goes straight to the final call;
    /// in [`ReductionMode::Recursive`] it is re-chunked and reduced again while it still splits
    /// into fewer, but more than one, chunks. Empty input produces no chunk calls and a single
    /// final call on the empty string.
    pub async fn summarize_document(&self, text: &str) -> Result<String, ProcessingError> {
        let mut document = text.to_string();
        let mut round = 0usize;

        loop {
            round += 1;
            let chunks = split_document_into_chunks(&document);
            let chunk_count = chunks.len();
            tracing::info!(round, chunk_count, "Summarizing chunks");

            let summaries = self.summarize_chunks(chunks).await?;
            self.metrics.record_round(chunk_count as u64);
            let intermediate = build_intermediate_document(&summaries);

            let ReductionMode::Recursive { max_rounds } = self.mode else {
                document = intermediate;
                break;
            };

            let next_count = split_document_into_chunks(&intermediate).len();
            if round >= max_rounds || next_count <= 1 || next_count >= chunk_count {
                tracing::debug!(round, next_count, "Stopping reduction");
                document = intermediate;
                break;
            }
            tracing::debug!(
                round,
                next_count,
                "Intermediate document still splits; reducing again"
            );
            document = intermediate;
        }

        tracing::info!(
            round,
            intermediate_len = document.len(),
            "Summarizing intermediate document"
        );
        self.summarize_with_retry("final", &document).await
    }

    /// Run [`Self::summarize_document`] until it finishes or `shutdown` resolves.
    ///
    /// A shutdown signal returns [`ProcessingError::Cancelled`] and drops the in-flight work, so
    /// no partial summary escapes. If the signal itself fails to install, the error is logged
    /// and the document is summarized to completion.
    pub async fn summarize_until<S>(
        &self,
        text: &str,
        shutdown: S,
    ) -> Result<String, ProcessingError>
    where
        S: Future<Output = io::Result<()>>,
    {
        let summary = self.summarize_document(text);
        tokio::pin!(summary);

        tokio::select! {
            result = &mut summary => return result,
            signal = shutdown => match signal {
                Ok(()) => {
                    tracing::warn!("Shutdown requested; abandoning summary");
                    return Err(ProcessingError::Cancelled);
                }
                Err(error) => {
                    tracing::warn!(%error, "Shutdown signal unavailable; continuing without it");
                }
            },
        }

        summary.await
    }

    /// Summarize one piece of text, retrying failures according to the retry policy.
    pub async fn summarize_with_retry(
        &self,
        label: &str,
        text: &str,
    ) -> Result<String, ProcessingError> {
        self.retry
            .run(label, &self.metrics, || {
                self.client
                    .generate_summary(SummarizationRequest::new(self.model.clone(), text))
            })
            .await
    }

    /// Retrieve the current metrics snapshot for diagnostics.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    async fn summarize_chunks(&self, chunks: Vec<String>) -> Result<Vec<String>, ProcessingError> {
        let total = chunks.len();
        stream::iter(chunks.into_iter().enumerate())
            .map(|(index, chunk)| async move {
                let label = format!("chunk {}/{total}", index + 1);
                self.summarize_with_retry(&label, &chunk).await
            })
            .buffered(self.concurrency)
            .try_collect()
            .await
    }
}
