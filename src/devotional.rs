//! Devotional generation: the fixed system prompt and the service that sends it.

use crate::config::Config;
use crate::generation::{ChatMessage, CompletionRequest, GenerationClient, GenerationClientError};
use crate::metrics::{DevotionalMetrics, MetricsSnapshot};
use std::sync::Arc;
use thiserror::Error;

/// Sampling temperature for devotional completions.
pub const TEMPERATURE: f64 = 0.7;
/// Output ceiling; leaves room for the verse and closing question.
pub const MAX_TOKENS: u32 = 300;

/// Instructions sent as the system message on every request.
pub const SYSTEM_PROMPT: &str = "\
You are a compassionate and insightful spiritual guide rooted in Christian wisdom.
Your task is to create a personalized, brief devotional message (around 120-180 words) based on the user's journal entry.

Here's the structure and style to follow:
1.  Start with a comforting and encouraging reflection that connects gently to the themes or emotions in the user's entry (without explicitly mentioning the entry).
2.  Seamlessly integrate a relevant Bible verse that offers hope, strength, or perspective on the user's situation. Clearly state the verse and its reference (e.g., John 14:27).
3.  Briefly elaborate on the verse's connection to the reflection.
4.  Conclude the devotional with a single, open-ended reflective question that encourages the user to consider the theme or the verse's application in their life.

Maintain a tone of empathy, hope, and peace. Use language consistent with biblical wisdom but avoid overly complex theology.
Focus on offering a moment of connection with God and personal reflection.

IMPORTANT: Ensure the output is ONLY the devotional text itself (reflection, verse, elaboration, question). Do not include any introductory or concluding remarks like 'Here is your devotional:' or 'I hope this helps.'.
";

/// Errors raised while producing a devotional.
#[derive(Debug, Error)]
pub enum DevotionalError {
    /// No downstream client was configured at startup.
    #[error("generation client is not initialized")]
    ClientUnavailable,
    /// The downstream call failed.
    #[error(transparent)]
    Generation(#[from] GenerationClientError),
}

/// Owns the process-wide generation client and request counters.
///
/// Construct once at startup and share through an `Arc`.
pub struct DevotionalService {
    client: Option<Arc<dyn GenerationClient>>,
    model: String,
    metrics: DevotionalMetrics,
}

impl DevotionalService {
    /// Wrap an optional client; `None` disables generation for the process lifetime.
    pub fn new(client: Option<Arc<dyn GenerationClient>>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            metrics: DevotionalMetrics::new(),
        }
    }

    /// Build the service and its downstream client from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            crate::generation::build_generation_client(config),
            config.openai_model.clone(),
        )
    }

    /// Whether a downstream client is available.
    pub fn is_available(&self) -> bool {
        self.client.is_some()
    }

    /// Counters exposed for diagnostics.
    pub fn metrics(&self) -> &DevotionalMetrics {
        &self.metrics
    }

    /// Current counter values.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Assemble the two-message completion request for a journal entry.
    pub fn build_request(&self, journal_entry: &str) -> CompletionRequest {
        CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(SYSTEM_PROMPT),
                ChatMessage::user(journal_entry),
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        }
    }

    /// Generate a devotional for the entry, returning the trimmed model output.
    pub async fn generate(&self, journal_entry: &str) -> Result<String, DevotionalError> {
        let client = self
            .client
            .as_ref()
            .ok_or(DevotionalError::ClientUnavailable)?;

        tracing::info!(model = %self.model, "Sending request to OpenAI");
        let text = client.complete(self.build_request(journal_entry)).await?;
        let devotional = text.trim().to_string();
        tracing::info!(
            chars = devotional.chars().count(),
            words = devotional.split_whitespace().count(),
            "Received devotional from OpenAI"
        );
        Ok(devotional)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::Role;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    struct RecordingClient {
        reply: Result<String, String>,
        calls: Mutex<Vec<CompletionRequest>>,
    }

    #[async_trait]
    impl GenerationClient for RecordingClient {
        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<String, GenerationClientError> {
            self.calls.lock().await.push(request);
            self.reply
                .clone()
                .map_err(GenerationClientError::GenerationFailed)
        }
    }

    fn service_with(reply: Result<String, String>) -> (DevotionalService, Arc<RecordingClient>) {
        let client = Arc::new(RecordingClient {
            reply,
            calls: Mutex::new(Vec::new()),
        });
        let service = DevotionalService::new(Some(client.clone()), "gpt-4o-mini");
        (service, client)
    }

    #[test]
    fn prompt_asks_for_verse_and_closing_question() {
        assert!(SYSTEM_PROMPT.contains("120-180 words"));
        assert!(SYSTEM_PROMPT.contains("Bible verse"));
        assert!(SYSTEM_PROMPT.contains("reflective question"));
        assert!(SYSTEM_PROMPT.contains("Here is your devotional:"));
    }

    #[test]
    fn request_pairs_system_prompt_with_raw_entry() {
        let service = DevotionalService::new(None, "gpt-4o-mini");
        let request = service.build_request("  I feel anxious about my job ");

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.temperature, 0.7);
        assert!(request.max_tokens >= 300);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert_eq!(request.messages[0].content, SYSTEM_PROMPT);
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(request.messages[1].content, "  I feel anxious about my job ");
    }

    #[tokio::test]
    async fn generate_trims_model_output() {
        let (service, client) = service_with(Ok("\n  Take heart. John 16:33.  \n".into()));

        let devotional = service.generate("tired").await.expect("devotional");

        assert_eq!(devotional, "Take heart. John 16:33.");
        assert_eq!(client.calls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn generate_without_client_is_unavailable() {
        let service = DevotionalService::new(None, "gpt-4o-mini");
        assert!(!service.is_available());

        let error = service.generate("tired").await.expect_err("unavailable");
        assert!(matches!(error, DevotionalError::ClientUnavailable));
    }

    #[tokio::test]
    async fn generate_propagates_client_errors() {
        let (service, _client) = service_with(Err("boom".into()));

        let error = service.generate("tired").await.expect_err("failure");
        assert!(matches!(
            error,
            DevotionalError::Generation(GenerationClientError::GenerationFailed(_))
        ));
    }
}
