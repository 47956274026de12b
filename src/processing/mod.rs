//! Document summarization pipeline: chunking, retrying provider calls, and reduction.

pub mod chunking;
pub mod retry;
mod service;
pub mod types;

pub use chunking::split_document_into_chunks;
pub use retry::RetryPolicy;
pub use service::SummaryPipeline;
pub use types::{ProcessingError, ReductionMode, build_intermediate_document};
