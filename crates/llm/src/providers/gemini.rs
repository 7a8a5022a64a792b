//! Google Gemini provider over the `generateContent` REST API.
//!
//! Gemini has no assistant role: assistant messages are sent with role
//! `model`.

use crate::client::{ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use yojana_core::{AppError, AppResult};

pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Finish reasons that mean the candidate was withheld for policy reasons.
const SAFETY_FINISH_REASONS: [&str; 4] = ["SAFETY", "PROHIBITED_CONTENT", "BLOCKLIST", "SPII"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, PartialEq)]
struct GeminiContent {
    role: &'static str,
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, PartialEq)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

/// Gemini LLM client.
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Llm(format!("Failed to create HTTP client for Gemini: {}", e)))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            client,
        })
    }

    fn to_gemini_request(request: &LlmRequest) -> GeminiRequest {
        let contents = request
            .messages
            .iter()
            .map(|message| GeminiContent {
                role: match message.role {
                    ChatRole::User => "user",
                    ChatRole::Assistant => "model",
                },
                parts: vec![GeminiPart {
                    text: message.content.clone(),
                }],
            })
            .collect();

        let generation_config = if request.temperature.is_some() || request.max_tokens.is_some() {
            Some(GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
            })
        } else {
            None
        };

        GeminiRequest {
            contents,
            generation_config,
        }
    }

    /// Turn a decoded response into text, a safety block, or an API error.
    fn interpret(response: GeminiResponse, requested_model: &str) -> AppResult<LlmResponse> {
        if let Some(reason) = response
            .prompt_feedback
            .as_ref()
            .and_then(|feedback| feedback.block_reason.clone())
        {
            return Err(AppError::SafetyBlocked(format!("prompt blocked: {}", reason)));
        }

        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Llm("Gemini returned no candidates".to_string()))?;

        let finish_reason = candidate.finish_reason.unwrap_or_default();

        // A safety stop discards any partial text
        if SAFETY_FINISH_REASONS.contains(&finish_reason.as_str()) {
            return Err(AppError::SafetyBlocked(format!(
                "response withheld: {}",
                finish_reason
            )));
        }

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AppError::Llm(format!(
                "Gemini returned an empty candidate (finish reason: {})",
                if finish_reason.is_empty() {
                    "unknown"
                } else {
                    finish_reason.as_str()
                }
            )));
        }

        let usage = response.usage_metadata.unwrap_or_default();

        Ok(LlmResponse {
            content: text,
            model: response
                .model_version
                .unwrap_or_else(|| requested_model.to_string()),
            usage: LlmUsage::new(usage.prompt_token_count, usage.candidates_token_count),
        })
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    async fn complete(&self, request: &LlmRequest) -> AppResult<LlmResponse> {
        tracing::info!(
            messages = request.messages.len(),
            model = %request.model,
            "Sending generateContent request to Gemini"
        );

        let body = Self::to_gemini_request(request);
        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to send request to Gemini: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::Llm(format!(
                "Gemini API error ({}): {}",
                status, error_text
            )));
        }

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Llm(format!("Failed to parse Gemini response: {}", e)))?;

        let result = Self::interpret(parsed, &request.model);
        if result.is_ok() {
            tracing::info!("Received completion from Gemini");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatMessage;

    fn parse(raw: &str) -> GeminiResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_request_maps_roles() {
        let request = LlmRequest::new(
            vec![
                ChatMessage::user("I am a student"),
                ChatMessage::assistant("Here are some schemes..."),
                ChatMessage::user("what about scholarships"),
            ],
            "gemini-2.0-flash",
        )
        .with_temperature(0.5);

        let body = GeminiClient::to_gemini_request(&request);

        let roles: Vec<_> = body.contents.iter().map(|c| c.role).collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(
            body.contents[1].parts,
            vec![GeminiPart {
                text: "Here are some schemes...".to_string()
            }]
        );

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["generationConfig"]["temperature"], 0.5);
        assert!(json["generationConfig"].get("maxOutputTokens").is_none());
    }

    #[test]
    fn test_interpret_success() {
        let response = parse(
            r####"{
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "### Answer:\n"}, {"text": "PM-KISAN"}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 50, "candidatesTokenCount": 8, "totalTokenCount": 58},
                "modelVersion": "gemini-2.0-flash-001"
            }"####,
        );

        let result = GeminiClient::interpret(response, "gemini-2.0-flash").unwrap();
        assert_eq!(result.content, "### Answer:\nPM-KISAN");
        assert_eq!(result.model, "gemini-2.0-flash-001");
        assert_eq!(result.usage.total_tokens, 58);
    }

    #[test]
    fn test_interpret_blocked_prompt() {
        let response = parse(r#"{"promptFeedback": {"blockReason": "SAFETY"}}"#);
        let err = GeminiClient::interpret(response, "gemini-2.0-flash").unwrap_err();
        assert!(matches!(err, AppError::SafetyBlocked(_)));
    }

    #[test]
    fn test_interpret_withheld_candidate() {
        let response = parse(r#"{"candidates": [{"finishReason": "SAFETY"}]}"#);
        let err = GeminiClient::interpret(response, "gemini-2.0-flash").unwrap_err();
        assert!(matches!(err, AppError::SafetyBlocked(_)));
    }

    #[test]
    fn test_interpret_safety_stop_discards_partial_text() {
        let response = parse(
            r#"{"candidates": [{"content": {"parts": [{"text": "Partial ans"}]}, "finishReason": "SAFETY"}]}"#,
        );
        let err = GeminiClient::interpret(response, "gemini-2.0-flash").unwrap_err();
        assert!(matches!(err, AppError::SafetyBlocked(_)));
        assert!(!err.to_string().contains("Partial ans"));
    }

    #[test]
    fn test_interpret_empty_candidate_is_api_error() {
        let response = parse(r#"{"candidates": [{"finishReason": "MAX_TOKENS"}]}"#);
        let err = GeminiClient::interpret(response, "gemini-2.0-flash").unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }

    #[test]
    fn test_interpret_no_candidates() {
        let response = parse(r#"{}"#);
        let err = GeminiClient::interpret(response, "gemini-2.0-flash").unwrap_err();
        assert!(matches!(err, AppError::Llm(_)));
    }
}
