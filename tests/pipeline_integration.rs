use std::{sync::Arc, time::Duration};

use docsum::{
    config::Config,
    processing::{ProcessingError, RetryPolicy, SummaryPipeline},
    summarization::{self, SummarizationClientError},
};
use httpmock::{Method::POST, MockServer};
use serde_json::json;

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [
            {
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }
        ]
    })
}

fn config_for(server: &MockServer, api_key: Option<&str>) -> Config {
    Config {
        groq_api_key: api_key.map(str::to_string),
        groq_base_url: server.base_url(),
        max_attempts: 2,
        backoff_unit_ms: 1,
        request_timeout_secs: 5,
        ..Config::default()
    }
}

fn pipeline_for(config: &Config) -> SummaryPipeline {
    let client = summarization::get_summarization_client(config).expect("client");
    SummaryPipeline::from_config(Arc::from(client), config)
}

#[tokio::test]
async fn document_is_mapped_and_reduced_over_http() {
    let server = MockServer::start_async().await;
    let first = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .header("authorization", "Bearer secret")
                .body_contains("Para one.");
            then.status(200).json_body(completion("Summary one."));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Para two.");
            then.status(200).json_body(completion("Summary two."));
        })
        .await;
    let last = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("Summary one.\\nSummary two.\\n");
            then.status(200).json_body(completion("Final summary."));
        })
        .await;

    let config = config_for(&server, Some("secret"));
    let pipeline = pipeline_for(&config);

    let summary = pipeline
        .summarize_document("Para one.\n\nPara two.")
        .await
        .expect("summary");

    assert_eq!(summary, "Final summary.");
    first.assert_hits_async(1).await;
    second.assert_hits_async(1).await;
    last.assert_hits_async(1).await;
    assert_eq!(pipeline.metrics_snapshot().attempts, 3);
}

#[tokio::test]
async fn provider_text_reaches_the_final_call_verbatim() {
    let server = MockServer::start_async().await;
    let chunk = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("P1");
            then.status(200).json_body(completion("S1\n\n"));
        })
        .await;
    let last = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("\"S1\\n\\n\\n\"");
            then.status(200).json_body(completion(" Final.\n"));
        })
        .await;

    let config = config_for(&server, Some("secret"));
    let pipeline = pipeline_for(&config);

    let summary = pipeline.summarize_document("P1").await.expect("summary");

    assert_eq!(summary, " Final.\n");
    chunk.assert_hits_async(1).await;
    last.assert_hits_async(1).await;
}

#[tokio::test]
async fn server_errors_exhaust_the_retry_budget() {
    let server = MockServer::start_async().await;
    let failing = server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(503).body("overloaded");
        })
        .await;

    let config = config_for(&server, Some("secret"));
    let pipeline = pipeline_for(&config);

    let error = pipeline
        .summarize_document("Para one.\n\nPara two.")
        .await
        .expect_err("run must fail");

    assert!(matches!(
        error,
        ProcessingError::RetriesExhausted {
            attempts: 2,
            source: SummarizationClientError::GenerationFailed(_)
        }
    ));
    failing.assert_hits_async(2).await;
}

#[tokio::test]
async fn missing_api_key_fails_after_retrying() {
    let server = MockServer::start_async().await;
    let config = config_for(&server, None);
    let pipeline = pipeline_for(&config).with_retry_policy(RetryPolicy::new(
        3,
        Duration::from_millis(1),
    ));

    let error = pipeline
        .summarize_document("")
        .await
        .expect_err("run must fail");

    assert!(matches!(
        error,
        ProcessingError::RetriesExhausted {
            attempts: 3,
            source: SummarizationClientError::MissingApiKey
        }
    ));
    assert_eq!(pipeline.metrics_snapshot().failed_attempts, 3);
}

#[tokio::test]
#[ignore = "Requires GROQ_API_KEY and network access"]
async fn live_groq_summary() {
    dotenvy::dotenv().ok();
    let config = Config::from_env().expect("config");
    assert!(config.groq_api_key.is_some(), "GROQ_API_KEY must be set");
    let pipeline = pipeline_for(&config);

    let summary = pipeline
        .summarize_document(
            "Rust is a systems programming language.\n\nIt focuses on safety and speed.",
        )
        .await
        .expect("live summary");

    assert!(!summary.trim().is_empty());
}
