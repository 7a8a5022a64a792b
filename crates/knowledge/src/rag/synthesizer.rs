//! Answer synthesis over an LLM client.

use std::sync::Arc;
use yojana_core::{AppError, AppResult};
use yojana_llm::{LlmClient, LlmRequest};
use yojana_prompt::AssembledPrompt;

/// Turns an assembled prompt into answer text.
///
/// Outcomes are closed: the text, `AppError::SafetyBlocked`, or
/// `AppError::Synthesis`. Nothing is retried.
#[async_trait::async_trait]
pub trait AnswerSynthesizer: Send + Sync {
    /// Human-readable backend name for logs and readiness
    fn name(&self) -> &str;

    async fn synthesize(&self, prompt: &AssembledPrompt) -> AppResult<String>;
}

/// Synthesizer backed by any `LlmClient`.
pub struct LlmSynthesizer {
    client: Arc<dyn LlmClient>,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl LlmSynthesizer {
    pub fn new(client: Arc<dyn LlmClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
            temperature: None,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn request(&self, prompt: &AssembledPrompt) -> LlmRequest {
        let mut request = LlmRequest::new(prompt.messages.clone(), self.model.clone());
        if let Some(temperature) = self.temperature {
            request = request.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }
        request
    }
}

#[async_trait::async_trait]
impl AnswerSynthesizer for LlmSynthesizer {
    fn name(&self) -> &str {
        self.client.provider_name()
    }

    async fn synthesize(&self, prompt: &AssembledPrompt) -> AppResult<String> {
        tracing::info!(
            provider = self.client.provider_name(),
            model = %self.model,
            segments = prompt.messages.len(),
            "Synthesizing answer"
        );

        match self.client.complete(&self.request(prompt)).await {
            Ok(response) => {
                tracing::debug!(
                    prompt_tokens = response.usage.prompt_tokens,
                    completion_tokens = response.usage.completion_tokens,
                    "Answer received"
                );
                Ok(response.content)
            }
            Err(AppError::SafetyBlocked(reason)) => {
                tracing::warn!(%reason, "Prompt blocked by provider safety filters");
                Err(AppError::SafetyBlocked(reason))
            }
            Err(other) => {
                tracing::error!(error = %other, "Answer synthesis failed");
                Err(AppError::Synthesis(other.to_string()))
            }
        }
    }
}
