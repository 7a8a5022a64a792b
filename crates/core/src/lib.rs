//! Yojana Core Library
//!
//! Foundational utilities shared by every Yojana crate:
//! - Error handling (`AppError`, `AppResult`)
//! - Logging infrastructure
//! - Configuration management
//! - Shared domain types (scheme records, conversation turns)

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, ErrorClass};
pub use types::{ConversationTurn, SchemeRecord, TurnRole};
