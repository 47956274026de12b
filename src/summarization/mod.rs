//! Abstractions for generating abstractive summaries via hosted language models.
//!
//! The pipeline only depends on [`SummarizationClient`]; the Groq-backed client speaks the
//! OpenAI-compatible chat completions protocol and can be pointed at any compatible endpoint
//! through `GROQ_BASE_URL`.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Instruction sent as the system message on every call.
pub const SYSTEM_PROMPT: &str = "Summarize the input text below.  Limit the summary to 1 paragraph and use a 1st grade reading level.";

/// Errors surfaced while attempting abstractive summarization.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// No credential was configured for the provider.
    #[error("Summarization provider credential missing: set GROQ_API_KEY")]
    MissingApiKey,
    /// Provider could not be reached.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Request payload passed to the summarization provider.
#[derive(Debug, Clone)]
pub struct SummarizationRequest {
    /// Fully qualified model identifier understood by the provider.
    pub model: String,
    /// Instruction placed in the system message.
    pub system_prompt: String,
    /// Text to summarize, sent verbatim as the user message.
    pub text: String,
}

impl SummarizationRequest {
    /// Build a request carrying the standard [`SYSTEM_PROMPT`].
    pub fn new(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            system_prompt: SYSTEM_PROMPT.to_string(),
            text: text.into(),
        }
    }
}

/// Interface implemented by abstractive summarization providers.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Generate a summary of `request.text` using the configured model.
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError>;
}

/// Build the summarization client described by configuration.
pub fn get_summarization_client(
    config: &Config,
) -> Result<Box<dyn SummarizationClient>, SummarizationClientError> {
    let client = GroqSummarizationClient::new(
        config.groq_base_url.clone(),
        config.groq_api_key.clone(),
        config.request_timeout(),
    )?;
    Ok(Box::new(client))
}

/// Client for Groq's OpenAI-compatible chat completions endpoint.
pub struct GroqSummarizationClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
}

impl GroqSummarizationClient {
    /// Construct a client for `base_url`; a missing key only fails once a call is made.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, SummarizationClientError> {
        let http = Client::builder()
            .user_agent("docsum/summary")
            .timeout(timeout)
            .build()
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to construct HTTP client: {error}"
                ))
            })?;
        Ok(Self {
            http,
            base_url,
            api_key,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[async_trait]
impl SummarizationClient for GroqSummarizationClient {
    async fn generate_summary(
        &self,
        request: SummarizationRequest,
    ) -> Result<String, SummarizationClientError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(SummarizationClientError::MissingApiKey)?;

        let payload = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": request.system_prompt },
                { "role": "user", "content": request.text },
            ],
        });

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode chat completion: {error}"
            ))
        })?;

        let choice = body.choices.into_iter().next().ok_or_else(|| {
            SummarizationClientError::InvalidResponse("response contained no choices".into())
        })?;
        choice.message.content.ok_or_else(|| {
            SummarizationClientError::InvalidResponse(
                "first choice carried no message content".into(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};

    fn client_for(server: &MockServer, api_key: Option<&str>) -> GroqSummarizationClient {
        GroqSummarizationClient::new(
            server.base_url(),
            api_key.map(str::to_string),
            Duration::from_secs(5),
        )
        .expect("client")
    }

    #[tokio::test]
    async fn groq_client_handles_successful_response() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, Some("test-key"));

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer test-key")
                    .json_body_partial(
                        json!({
                            "model": "llama3-8b-8192",
                            "messages": [
                                { "role": "system", "content": SYSTEM_PROMPT },
                                { "role": "user", "content": "Para one." },
                            ],
                        })
                        .to_string(),
                    );
                then.status(200).json_body(json!({
                    "choices": [
                        { "index": 0, "message": { "role": "assistant", "content": "  Short summary.\n" } }
                    ]
                }));
            })
            .await;

        let summary = client
            .generate_summary(SummarizationRequest::new("llama3-8b-8192", "Para one."))
            .await
            .expect("summary");

        mock.assert_async().await;
        assert_eq!(summary, "  Short summary.\n");
    }

    #[tokio::test]
    async fn groq_client_handles_error_status() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, Some("test-key"));

        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(429).body("rate limited");
            })
            .await;

        let error = client
            .generate_summary(SummarizationRequest::new("llama3-8b-8192", "text"))
            .await
            .expect_err("error response");

        assert!(
            matches!(error, SummarizationClientError::GenerationFailed(ref message) if message.contains("429"))
        );
    }

    #[tokio::test]
    async fn groq_client_rejects_empty_choices() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, Some("test-key"));

        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({ "choices": [] }));
            })
            .await;

        let error = client
            .generate_summary(SummarizationRequest::new("llama3-8b-8192", "text"))
            .await
            .expect_err("no choices");

        assert!(
            matches!(error, SummarizationClientError::InvalidResponse(ref message) if message.contains("no choices"))
        );
    }

    #[tokio::test]
    async fn groq_client_rejects_null_content() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, Some("test-key"));

        server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200).json_body(json!({
                    "choices": [
                        { "index": 0, "message": { "role": "assistant", "content": null } }
                    ]
                }));
            })
            .await;

        let error = client
            .generate_summary(SummarizationRequest::new("llama3-8b-8192", "text"))
            .await
            .expect_err("null content");

        assert!(
            matches!(error, SummarizationClientError::InvalidResponse(ref message) if message.contains("no message content"))
        );
    }

    #[tokio::test]
    async fn groq_client_without_key_fails_before_sending() {
        let server = MockServer::start_async().await;
        let client = client_for(&server, None);

        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/chat/completions");
                then.status(200);
            })
            .await;

        let error = client
            .generate_summary(SummarizationRequest::new("llama3-8b-8192", "text"))
            .await
            .expect_err("missing key");

        assert!(matches!(error, SummarizationClientError::MissingApiKey));
        assert_eq!(mock.hits_async().await, 0);
    }
}
