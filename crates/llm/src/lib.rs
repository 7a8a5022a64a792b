//! LLM integration crate for Yojana.
//!
//! A provider-agnostic abstraction over chat-style completion APIs. The
//! answer synthesizer talks to `LlmClient` and never to a vendor SDK.
//!
//! # Providers
//! - **Ollama**: Local LLM runtime (default)
//! - **Gemini**: Google's hosted `generateContent` API
//!
//! # Example
//! ```no_run
//! use std::time::Duration;
//! use yojana_llm::{ChatMessage, LlmClient, LlmRequest, providers::OllamaClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = OllamaClient::new("http://localhost:11434", Duration::from_secs(60))?;
//! let request = LlmRequest::new(vec![ChatMessage::user("Hello, world!")], "llama3.2");
//! let response = client.complete(&request).await?;
//! println!("{}", response.content);
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod factory;
pub mod providers;
pub mod types;

// Re-export main types
pub use client::{ChatMessage, ChatRole, LlmClient, LlmRequest, LlmResponse, LlmUsage};
pub use factory::create_client;
pub use providers::{GeminiClient, OllamaClient};
pub use types::ProviderType;
