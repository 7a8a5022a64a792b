//! Prompt system for Yojana.
//!
//! - YAML prompt definitions with a built-in default
//! - Handlebars rendering of the instruction template
//! - Assembly of the ordered, role-tagged prompt for one query

pub mod builder;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::{assemble, render_context, ANSWER_PRIMER, NOT_AVAILABLE};
pub use loader::{builtin_answer_prompt, load_answer_prompt, load_prompt, ANSWER_PROMPT_ID};
pub use types::{AssembleOptions, AssembledPrompt, AssembledPromptMetadata, PromptDefinition};
