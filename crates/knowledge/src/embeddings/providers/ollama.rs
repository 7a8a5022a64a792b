//! Ollama embedding provider.
//!
//! Embeds one text per request via `/api/embeddings`. Each request is
//! bounded by the client timeout and is never retried.

use crate::embeddings::EmbeddingProvider;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};
use yojana_core::{AppError, AppResult};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const EMBEDDING_ENDPOINT: &str = "/api/embeddings";

/// Ollama embedding provider using the local API.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    base_url: String,
    /// Model name (e.g., "nomic-embed-text")
    model: String,
    /// Expected embedding dimensions
    dimensions: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: String,
}

impl OllamaProvider {
    /// Build the provider. No request is made until the first embedding.
    pub fn new(
        base_url: Option<&str>,
        model: &str,
        dimensions: usize,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::Embedding(format!("Failed to create HTTP client for Ollama: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url
                .unwrap_or(DEFAULT_OLLAMA_URL)
                .trim_end_matches('/')
                .to_string(),
            model: model.to_string(),
            dimensions,
        })
    }

    #[instrument(skip(self, text), fields(text_len = text.len(), model = %self.model))]
    async fn embed_single(&self, text: &str) -> AppResult<Vec<f32>> {
        let url = format!("{}{}", self.base_url, EMBEDDING_ENDPOINT);
        let request = EmbeddingRequest {
            model: &self.model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to reach Ollama at {}: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error)
                .unwrap_or(error_text);
            return Err(AppError::Embedding(format!(
                "Ollama API error ({}): {}",
                status, message
            )));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AppError::Embedding(format!("Failed to parse Ollama response: {}", e)))?;

        debug!("Generated {} dimensional embedding", body.embedding.len());

        Ok(body.embedding)
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for OllamaProvider {
    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, text: &str) -> AppResult<Vec<f32>> {
        self.embed_single(text).await
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        // No batch endpoint; embed sequentially
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed_single(text).await?);
        }
        Ok(embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let provider =
            OllamaProvider::new(None, "nomic-embed-text", 768, Duration::from_secs(5)).unwrap();
        assert_eq!(provider.base_url, DEFAULT_OLLAMA_URL);
        assert_eq!(provider.dimensions(), 768);
    }

    #[test]
    fn test_custom_endpoint_trailing_slash() {
        let provider = OllamaProvider::new(
            Some("http://embeddings:11434/"),
            "bge-base",
            768,
            Duration::from_secs(5),
        )
        .unwrap();
        assert_eq!(provider.base_url, "http://embeddings:11434");
        assert_eq!(provider.model_name(), "bge-base");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_embedding_error() {
        // Port 9 (discard) is closed on test hosts
        let provider = OllamaProvider::new(
            Some("http://127.0.0.1:9"),
            "nomic-embed-text",
            768,
            Duration::from_secs(2),
        )
        .unwrap();

        let err = provider.embed("farmers").await.unwrap_err();
        assert!(matches!(err, AppError::Embedding(_)));
    }
}
