//! Client seam for the external chat-completion API.
//!
//! The service only needs "send a system prompt and a user message, get text back", so the
//! trait is deliberately narrow. [`OpenAiClient`] speaks the OpenAI `chat/completions` wire
//! format, which most hosted providers also accept.

use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced while requesting a completion.
#[derive(Debug, Error)]
pub enum GenerationClientError {
    /// The HTTP client could not be constructed.
    #[error("Failed to initialize generation client: {0}")]
    Initialization(String),
    /// Provider was unreachable or did not answer in time.
    #[error("Generation provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate completion: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed or carried no message content.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Author of a chat message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Instructions that frame the exchange.
    System,
    /// End-user content.
    User,
}

/// One message in a chat exchange.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChatMessage {
    /// Who authored the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Build a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Build a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Request payload passed to the generation provider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    /// Model identifier understood by the provider.
    pub model: String,
    /// Ordered chat messages.
    pub messages: Vec<ChatMessage>,
    /// Sampling temperature.
    pub temperature: f64,
    /// Ceiling on generated tokens.
    pub max_tokens: u32,
}

/// Interface implemented by text-generation providers.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Run a single completion and return the generated text.
    async fn complete(&self, request: CompletionRequest)
    -> Result<String, GenerationClientError>;
}

/// Build the downstream client from configuration.
///
/// Returns `None` when no credential is configured or the HTTP client cannot be built. Both
/// cases are logged here; the caller keeps running without generation.
pub fn build_generation_client(config: &Config) -> Option<Arc<dyn GenerationClient>> {
    let Some(api_key) = config.openai_api_key.clone() else {
        tracing::warn!("OPENAI_API_KEY environment variable not set. Devotional generation will fail.");
        return None;
    };

    match OpenAiClient::new(
        config.openai_base_url.clone(),
        api_key,
        config.request_timeout,
    ) {
        Ok(client) => {
            tracing::info!(
                base_url = %config.openai_base_url,
                timeout_secs = config.request_timeout.as_secs(),
                "OpenAI client initialized"
            );
            Some(Arc::new(client))
        }
        Err(error) => {
            tracing::error!(%error, "Failed to initialize OpenAI client");
            None
        }
    }
}

/// HTTP adapter for OpenAI-compatible `chat/completions` endpoints.
pub struct OpenAiClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    /// Construct a client with an explicit per-request timeout.
    pub fn new(
        base_url: String,
        api_key: String,
        timeout: Duration,
    ) -> Result<Self, GenerationClientError> {
        let http = Client::builder()
            .user_agent(concat!("daily-light/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|error| GenerationClientError::Initialization(error.to_string()))?;
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
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl GenerationClient for OpenAiClient {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<String, GenerationClientError> {
        tracing::debug!(
            model = %request.model,
            messages = request.messages.len(),
            max_tokens = request.max_tokens,
            "Sending completion request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|error| {
                let reason = if error.is_timeout() {
                    "request timed out"
                } else {
                    "request failed"
                };
                GenerationClientError::ProviderUnavailable(format!(
                    "{reason} for {}: {error}",
                    self.base_url
                ))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationClientError::GenerationFailed(format!(
                "provider returned {status}: {body}"
            )));
        }

        let body: ChatCompletionResponse = response.json().await.map_err(|error| {
            GenerationClientError::InvalidResponse(format!(
                "failed to decode completion response: {error}"
            ))
        })?;

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                GenerationClientError::InvalidResponse("completion carried no message content".into())
            })
    }
}
