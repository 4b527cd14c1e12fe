//! Hosted language-model client.
//!
//! The Anthropic adapter issues a single Messages API request per prompt. Nothing is retried;
//! callers decide whether a failure ends the operation or only the current chunk.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Errors surfaced while asking the model a question.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The provider could not be reached.
    #[error("Model provider unavailable: {0}")]
    Unavailable(String),
    /// The provider answered with a non-success status (bad key, rate limit, ...).
    #[error("Model request failed with {status}: {body}")]
    RequestFailed {
        /// HTTP status returned by the provider.
        status: u16,
        /// Raw response body, kept for the server log.
        body: String,
    },
    /// The provider response could not be interpreted.
    #[error("Malformed model response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by question-answering model backends.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send a fully rendered prompt and return the generated text.
    async fn ask(&self, prompt: &str) -> Result<String, ModelError>;
}

/// Settings for the Anthropic Messages API adapter.
#[derive(Debug, Clone)]
pub struct AnthropicSettings {
    /// API key placed in the `x-api-key` header.
    pub api_key: String,
    /// Provider root, e.g. `https://api.anthropic.com`.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

impl From<&Config> for AnthropicSettings {
    fn from(config: &Config) -> Self {
        Self {
            api_key: config.anthropic_api_key.clone(),
            base_url: config.anthropic_base_url.clone(),
            model: config.anthropic_model.clone(),
            max_tokens: config.anthropic_max_tokens,
        }
    }
}

/// [`ModelClient`] backed by the Anthropic Messages API.
pub struct AnthropicClient {
    http: Client,
    settings: AnthropicSettings,
}

impl AnthropicClient {
    /// Build a client for the given settings.
    pub fn new(settings: AnthropicSettings) -> Result<Self, ModelError> {
        let http = Client::builder()
            .user_agent("pdfchat")
            .build()
            .map_err(|error| {
                ModelError::Unavailable(format!("failed to construct HTTP client: {error}"))
            })?;
        Ok(Self { http, settings })
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.settings.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[async_trait]
impl ModelClient for AnthropicClient {
    async fn ask(&self, prompt: &str) -> Result<String, ModelError> {
        let payload = MessagesRequest {
            model: &self.settings.model,
            max_tokens: self.settings.max_tokens,
            // Deterministic answers for document lookups.
            temperature: 0.0,
            messages: [Message {
                role: "user",
                content: prompt,
            }],
        };

        tracing::debug!(
            model = %self.settings.model,
            prompt_chars = prompt.len(),
            "Sending prompt to model"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-api-key", &self.settings.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                ModelError::Unavailable(format!(
                    "failed to reach {}: {error}",
                    self.settings.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::RequestFailed { status, body });
        }

        let body: MessagesResponse = response.json().await.map_err(|error| {
            ModelError::InvalidResponse(format!("failed to decode response: {error}"))
        })?;

        body.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| ModelError::InvalidResponse("response carried no text block".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::{Method::POST, MockServer};
    use serde_json::json;

    fn client_for(server: &MockServer) -> AnthropicClient {
        AnthropicClient::new(AnthropicSettings {
            api_key: "sk-test".into(),
            base_url: server.base_url(),
            model: "claude-test".into(),
            max_tokens: 500,
        })
        .expect("client")
    }

    #[tokio::test]
    async fn anthropic_client_returns_first_text_block() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .header("x-api-key", "sk-test")
                    .header("anthropic-version", ANTHROPIC_VERSION)
                    .json_body(json!({
                        "model": "claude-test",
                        "max_tokens": 500,
                        "temperature": 0.0,
                        "messages": [{ "role": "user", "content": "What is inside?" }]
                    }));
                then.status(200).json_body(json!({
                    "id": "msg_1",
                    "type": "message",
                    "role": "assistant",
                    "content": [{ "type": "text", "text": "A cat." }]
                }));
            })
            .await;

        let answer = client.ask("What is inside?").await.expect("answer");

        mock.assert_async().await;
        assert_eq!(answer, "A cat.");
    }

    #[tokio::test]
    async fn anthropic_client_reports_error_status() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(429).body("rate limited");
            })
            .await;

        let error = client.ask("prompt").await.unwrap_err();
        assert!(matches!(
            error,
            ModelError::RequestFailed { status: 429, ref body } if body == "rate limited"
        ));
    }

    #[tokio::test]
    async fn anthropic_client_rejects_response_without_text() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200).json_body(json!({ "content": [] }));
            })
            .await;

        let error = client.ask("prompt").await.unwrap_err();
        assert!(matches!(error, ModelError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn anthropic_client_rejects_malformed_body() {
        let server = MockServer::start_async().await;
        let client = client_for(&server);

        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/messages");
                then.status(200).body("<html>oops</html>");
            })
            .await;

        let error = client.ask("prompt").await.unwrap_err();
        assert!(matches!(error, ModelError::InvalidResponse(_)));
    }
}
