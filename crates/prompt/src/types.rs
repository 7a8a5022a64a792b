//! Prompt types.
//!
//! A `PromptDefinition` is the instruction template; an `AssembledPrompt`
//! is the ordered list of role-tagged segments sent to the LLM.

use serde::{Deserialize, Serialize};
use yojana_llm::ChatMessage;

/// An instruction template, built in or loaded from YAML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// Handlebars template for the instruction segment.
    /// Receives a single variable, `context`.
    pub template: String,
}

/// Knobs for prompt assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssembleOptions {
    /// Append a trailing assistant segment `### Answer:` as a style nudge
    pub answer_primer: bool,
}

impl Default for AssembleOptions {
    fn default() -> Self {
        Self {
            answer_primer: true,
        }
    }
}

/// A fully assembled prompt ready for LLM execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledPrompt {
    /// Ordered segments: instruction, history, question, optional primer
    pub messages: Vec<ChatMessage>,

    /// Metadata about the assembled prompt
    pub metadata: AssembledPromptMetadata,
}

/// Metadata about an assembled prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssembledPromptMetadata {
    /// Source prompt ID
    pub source_prompt_id: String,

    /// Number of scheme records placed in the context block
    pub record_count: usize,

    /// Number of prior conversation turns carried over
    pub history_turns: usize,
}
