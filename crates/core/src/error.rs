//! Error types for Yojana.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! serialization, LLM transport, and the query pipeline failure categories.

use thiserror::Error;

/// Generic message shown to users for server-side failures.
const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while answering your question. Please try again later.";

/// Unified error type for Yojana.
///
/// All fallible functions return `Result<T, AppError>`.
/// Errors are represented and propagated, never panicked on.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Malformed request (empty query, invalid k)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Shared resources are not loaded yet
    #[error("Service not ready: {0}")]
    NotReady(String),

    /// Query encoder unavailable or dimension mismatch
    #[error("Embedding failure: {0}")]
    Embedding(String),

    /// Catalog or index artifact could not be loaded
    #[error("Knowledge error: {0}")]
    Knowledge(String),

    /// LLM transport or API errors raised by provider clients
    #[error("LLM error: {0}")]
    Llm(String),

    /// The provider refused the prompt on content-safety grounds
    #[error("Prompt blocked by safety filters: {0}")]
    SafetyBlocked(String),

    /// Answer synthesis failed after the prompt was sent
    #[error("Synthesis failure: {0}")]
    Synthesis(String),

    /// Prompt template errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Unexpected failures
    #[error("{0}")]
    Other(String),
}

/// Who can act on an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The caller can fix it (rephrase, change input)
    Client,
    /// The service is not ready to accept queries
    Unavailable,
    /// Server-side failure
    Server,
}

impl AppError {
    /// Classify the error for response mapping.
    pub fn class(&self) -> ErrorClass {
        match self {
            AppError::InvalidRequest(_) | AppError::SafetyBlocked(_) => ErrorClass::Client,
            AppError::NotReady(_) => ErrorClass::Unavailable,
            _ => ErrorClass::Server,
        }
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self.class() {
            ErrorClass::Client => 400,
            ErrorClass::Unavailable => 503,
            ErrorClass::Server => 500,
        }
    }

    /// Message safe to show to the end user.
    ///
    /// Server-side failures never expose their cause here; it is logged instead.
    pub fn user_message(&self) -> String {
        match self {
            AppError::InvalidRequest(msg) => msg.clone(),
            AppError::SafetyBlocked(_) => "The query was blocked by the safety system. \
                 Please try rephrasing your question."
                .to_string(),
            AppError::NotReady(_) => {
                "The service is still starting up. Please try again shortly.".to_string()
            }
            AppError::Synthesis(_) | AppError::Llm(_) => {
                "Error communicating with the AI service. Please try again later.".to_string()
            }
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safety_block_is_client_facing() {
        let err = AppError::SafetyBlocked("SAFETY".to_string());
        assert_eq!(err.class(), ErrorClass::Client);
        assert_eq!(err.status_code(), 400);
        assert!(err.user_message().contains("rephrasing"));
    }

    #[test]
    fn test_synthesis_failure_hides_cause() {
        let err = AppError::Synthesis("connection refused to 10.0.0.3".to_string());
        assert_eq!(err.status_code(), 500);
        assert!(!err.user_message().contains("10.0.0.3"));
    }

    #[test]
    fn test_unexpected_failure_is_generic() {
        let err = AppError::Other("index poisoned at offset 42".to_string());
        assert_eq!(err.class(), ErrorClass::Server);
        assert_eq!(err.user_message(), GENERIC_FAILURE_MESSAGE);
    }

    #[test]
    fn test_not_ready_status() {
        let err = AppError::NotReady("catalog".to_string());
        assert_eq!(err.status_code(), 503);
    }
}
