#![deny(missing_docs)]

//! Core library for docsum, a chunk-and-reduce document summarizer.

/// Environment-driven configuration management.
pub mod config;
/// Structured logging and tracing setup.
pub mod logging;
/// Pipeline metrics helpers.
pub mod metrics;
/// Chunking, retry, and reduction pipeline.
pub mod processing;
/// Language-model summarization client abstraction and adapters.
pub mod summarization;
