//! Prompt assembly: context serialization, template rendering, and
//! segment ordering.

use crate::types::{AssembleOptions, AssembledPrompt, AssembledPromptMetadata, PromptDefinition};
use handlebars::Handlebars;
use std::collections::HashMap;
use yojana_core::{AppError, AppResult, ConversationTurn, SchemeRecord};
use yojana_llm::{ChatMessage, ChatRole};

/// Marker rendered in place of a missing record field.
pub const NOT_AVAILABLE: &str = "Not available";

/// Separator placed between record paragraphs.
const RECORD_SEPARATOR: &str = "\n\n---\n\n";

/// Trailing assistant segment that nudges the answer format.
pub const ANSWER_PRIMER: &str = "### Answer:";

/// Assemble the ordered prompt for one query.
///
/// Segments, in order:
/// 1. The instruction (user role) with the serialized context block
/// 2. Prior conversation turns, original roles and order
/// 3. The current question (user role)
/// 4. Optionally, an assistant `### Answer:` primer
///
/// Pure; the only failure is a template that does not render.
///
/// # Example
/// ```
/// use yojana_core::SchemeRecord;
/// use yojana_prompt::{assemble, builtin_answer_prompt, AssembleOptions};
///
/// let records = vec![SchemeRecord::new("Farmer Support Scheme").with_state("Punjab")];
/// let prompt = assemble(
///     &builtin_answer_prompt(),
///     &records,
///     &[],
///     "help for farmers",
///     AssembleOptions::default(),
/// )
/// .unwrap();
/// assert_eq!(prompt.messages.len(), 3);
/// ```
pub fn assemble(
    definition: &PromptDefinition,
    records: &[SchemeRecord],
    history: &[ConversationTurn],
    query: &str,
    options: AssembleOptions,
) -> AppResult<AssembledPrompt> {
    tracing::debug!(
        prompt = %definition.id,
        records = records.len(),
        history = history.len(),
        "Assembling prompt"
    );

    let mut variables = HashMap::new();
    variables.insert("context".to_string(), render_context(records));
    let instruction = render_template(&definition.template, &variables)?;

    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(ChatMessage::user(instruction));
    messages.extend(
        history
            .iter()
            .map(|turn| ChatMessage::new(ChatRole::from(turn.role), turn.content.clone())),
    );
    messages.push(ChatMessage::user(format!("### Current Question:\n{}", query)));
    if options.answer_primer {
        messages.push(ChatMessage::assistant(ANSWER_PRIMER));
    }

    Ok(AssembledPrompt {
        messages,
        metadata: AssembledPromptMetadata {
            source_prompt_id: definition.id.clone(),
            record_count: records.len(),
            history_turns: history.len(),
        },
    })
}

/// Serialize records into the context block, one paragraph per record.
pub fn render_context(records: &[SchemeRecord]) -> String {
    records
        .iter()
        .map(render_record)
        .collect::<Vec<_>>()
        .join(RECORD_SEPARATOR)
}

fn render_record(record: &SchemeRecord) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());

    format!(
        "### Scheme: {}\nDescription: {}\nCategory: {}\nDepartment: {}\nState: {}\nLink: {}",
        record.title,
        field(&record.full_document_text),
        field(&record.category),
        field(&record.department),
        field(&record.state),
        field(&record.link),
    )
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Disable HTML escaping for plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    let rendered = handlebars
        .render("prompt", &variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))?;

    Ok(rendered)
}
