//! Embedding provider trait and factory.

use std::sync::Arc;
use std::time::Duration;
use yojana_core::config::EmbeddingSettings;
use yojana_core::{AppError, AppResult};

/// Default timeout for embedding requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Trait for embedding providers.
///
/// `embed` must be deterministic for a given model. Failures are reported
/// once; callers do not retry.
#[async_trait::async_trait]
pub trait EmbeddingProvider: Send + Sync + std::fmt::Debug {
    /// Get provider name (e.g., "mock", "ollama")
    fn provider_name(&self) -> &str;

    /// Get model identifier
    fn model_name(&self) -> &str;

    /// Get embedding dimensions
    fn dimensions(&self) -> usize;

    /// Generate embeddings for multiple texts in a batch.
    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>>;

    /// Generate embedding for a single text (convenience method).
    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        let mut results = self.embed_batch(&[text.to_string()]).await?;
        results
            .pop()
            .ok_or_else(|| AppError::Embedding("No embedding returned".to_string()))
    }
}

/// Create an embedding provider from configuration.
pub fn create_provider(settings: &EmbeddingSettings) -> AppResult<Arc<dyn EmbeddingProvider>> {
    match settings.provider.as_str() {
        "mock" => {
            let provider = super::providers::mock::MockProvider::new(settings.dimensions);
            Ok(Arc::new(provider))
        }

        "ollama" => {
            let timeout = Duration::from_secs(settings.timeout.unwrap_or(DEFAULT_TIMEOUT_SECS));
            let provider = super::providers::ollama::OllamaProvider::new(
                settings.endpoint.as_deref(),
                &settings.model,
                settings.dimensions,
                timeout,
            )?;
            Ok(Arc::new(provider))
        }

        _ => Err(AppError::Config(format!(
            "Unknown embedding provider: '{}'. Supported providers: mock, ollama",
            settings.provider
        ))),
    }
}
