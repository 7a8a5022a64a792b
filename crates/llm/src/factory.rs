//! LLM provider factory.
//!
//! Resolves a provider name to a concrete client. Secrets are passed in
//! already resolved; see `AppConfig::resolve_api_key`.

use crate::client::LlmClient;
use crate::providers::gemini::DEFAULT_GEMINI_URL;
use crate::providers::ollama::DEFAULT_OLLAMA_URL;
use crate::providers::{GeminiClient, OllamaClient};
use crate::types::ProviderType;
use std::sync::Arc;
use std::time::Duration;

/// Create an LLM client based on the provider name.
///
/// # Arguments
/// * `provider` - Provider identifier ("ollama", "gemini")
/// * `endpoint` - Optional custom endpoint URL
/// * `api_key` - API key, required by hosted providers
/// * `timeout` - Per-request timeout
///
/// # Errors
/// Returns error if the provider is unknown, a required key is missing,
/// or the HTTP client cannot be built.
pub fn create_client(
    provider: &str,
    endpoint: Option<&str>,
    api_key: Option<&str>,
    timeout: Duration,
) -> Result<Arc<dyn LlmClient>, String> {
    let provider_type =
        ProviderType::parse(provider).ok_or_else(|| format!("Unknown provider: {}", provider))?;

    match provider_type {
        ProviderType::Ollama => {
            let base_url = endpoint.unwrap_or(DEFAULT_OLLAMA_URL);
            let client = OllamaClient::new(base_url, timeout).map_err(|e| e.to_string())?;
            Ok(Arc::new(client))
        }
        ProviderType::Gemini => {
            let api_key = api_key
                .filter(|key| !key.trim().is_empty())
                .ok_or_else(|| "Gemini provider requires API key".to_string())?;
            let base_url = endpoint.unwrap_or(DEFAULT_GEMINI_URL);
            let client =
                GeminiClient::new(base_url, api_key, timeout).map_err(|e| e.to_string())?;
            Ok(Arc::new(client))
        }
    }
}
