//! Prompt loader for YAML prompt definitions.
//!
//! Overrides live in `.yojana/prompts/<id>.yml`; when none exists the
//! built-in scheme-advisor template is used.

use crate::types::PromptDefinition;
use std::path::Path;
use yojana_core::{AppError, AppResult};

/// Identifier of the answer instruction template.
pub const ANSWER_PROMPT_ID: &str = "scheme.answer";

const BUILTIN_ANSWER_TEMPLATE: &str = "You are Yojana, a kind and knowledgeable advisor that helps Indian citizens discover relevant government schemes.

Based *only* on the schemes provided in the context below, suggest helpful options to the user. Explain why each scheme applies to them (for example: farmers, students, a particular state).
Format your answer using Markdown, with a heading for each suggested scheme, bullet points for details, and bold text where appropriate.

If nothing in the provided context answers the user's question, say so politely and suggest what details the user could add to get better help. Do not make up information.

### Context:
{{context}}";

/// The built-in answer instruction template.
pub fn builtin_answer_prompt() -> PromptDefinition {
    PromptDefinition {
        id: ANSWER_PROMPT_ID.to_string(),
        title: "Scheme advisor answer".to_string(),
        api_version: "1.0".to_string(),
        created_by: "yojana".to_string(),
        template: BUILTIN_ANSWER_TEMPLATE.to_string(),
    }
}

/// Load a prompt definition by ID from the workspace.
///
/// Searches for `<id>.yml` in the `.yojana/prompts/` directory.
///
/// # Example
/// ```no_run
/// use yojana_prompt::load_prompt;
/// use std::path::Path;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let prompt = load_prompt(Path::new("."), "scheme.answer")?;
/// println!("Loaded prompt: {}", prompt.title);
/// # Ok(())
/// # }
/// ```
pub fn load_prompt(workspace_path: &Path, prompt_id: &str) -> AppResult<PromptDefinition> {
    let prompt_file = prompt_path(workspace_path, prompt_id);

    tracing::debug!("Loading prompt from: {:?}", prompt_file);

    if !prompt_file.exists() {
        return Err(AppError::Prompt(format!(
            "Prompt file not found: {:?}",
            prompt_file
        )));
    }

    let contents = std::fs::read_to_string(&prompt_file).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to read prompt file {:?}: {}",
            prompt_file, e
        ))
    })?;

    let definition: PromptDefinition = serde_yaml::from_str(&contents).map_err(|e| {
        AppError::Prompt(format!(
            "Failed to parse prompt YAML {:?}: {}",
            prompt_file, e
        ))
    })?;

    validate_prompt(&definition)?;

    tracing::info!("Loaded prompt: {} ({})", definition.id, definition.title);

    Ok(definition)
}

/// Load the answer template, falling back to the built-in one when the
/// workspace has no override.
pub fn load_answer_prompt(workspace_path: &Path) -> AppResult<PromptDefinition> {
    if prompt_path(workspace_path, ANSWER_PROMPT_ID).exists() {
        load_prompt(workspace_path, ANSWER_PROMPT_ID)
    } else {
        Ok(builtin_answer_prompt())
    }
}

fn prompt_path(workspace_path: &Path, prompt_id: &str) -> std::path::PathBuf {
    workspace_path
        .join(".yojana/prompts")
        .join(format!("{}.yml", prompt_id))
}

/// Validate a prompt definition.
fn validate_prompt(def: &PromptDefinition) -> AppResult<()> {
    if def.id.is_empty() {
        return Err(AppError::Prompt("Prompt ID cannot be empty".to_string()));
    }

    if def.title.is_empty() {
        return Err(AppError::Prompt("Prompt title cannot be empty".to_string()));
    }

    if def.template.is_empty() {
        return Err(AppError::Prompt(
            "Prompt template cannot be empty".to_string(),
        ));
    }

    if !def.api_version.contains('.') {
        return Err(AppError::Prompt(format!(
            "Invalid apiVersion format: {}. Expected format: 'x.y'",
            def.api_version
        )));
    }

    // The context slot is mandatory
    if !def.template.contains("{{context}}") {
        return Err(AppError::Prompt(format!(
            "Prompt {} does not reference {{{{context}}}}",
            def.id
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_prompt(dir: &Path, id: &str, body: &str) {
        let prompts_dir = dir.join(".yojana/prompts");
        fs::create_dir_all(&prompts_dir).unwrap();
        fs::write(prompts_dir.join(format!("{}.yml", id)), body).unwrap();
    }

    #[test]
    fn test_builtin_prompt_is_valid() {
        let def = builtin_answer_prompt();
        assert!(validate_prompt(&def).is_ok());
        assert!(def.template.contains("Do not make up information"));
    }

    #[test]
    fn test_load_answer_prompt_falls_back_to_builtin() {
        let temp = TempDir::new().unwrap();
        let def = load_answer_prompt(temp.path()).unwrap();
        assert_eq!(def.template, BUILTIN_ANSWER_TEMPLATE);
    }

    #[test]
    fn test_load_answer_prompt_override() {
        let temp = TempDir::new().unwrap();
        write_prompt(
            temp.path(),
            ANSWER_PROMPT_ID,
            r#"
id: scheme.answer
title: Terse advisor
apiVersion: "1.1"
template: "Only use this:\n{{context}}"
"#,
        );

        let def = load_answer_prompt(temp.path()).unwrap();
        assert_eq!(def.title, "Terse advisor");
        assert_eq!(def.template, "Only use this:\n{{context}}");
    }

    #[test]
    fn test_load_missing_prompt() {
        let temp = TempDir::new().unwrap();
        let result = load_prompt(temp.path(), "nope");
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_override_without_context_slot_is_rejected() {
        let temp = TempDir::new().unwrap();
        write_prompt(
            temp.path(),
            ANSWER_PROMPT_ID,
            "id: scheme.answer\ntitle: Broken\napiVersion: \"1.0\"\ntemplate: \"Just answer.\"\n",
        );

        let err = load_answer_prompt(temp.path()).unwrap_err();
        assert!(err.to_string().contains("{{context}}"));
    }

    #[test]
    fn test_invalid_api_version() {
        let mut def = builtin_answer_prompt();
        def.api_version = "1".to_string();
        assert!(validate_prompt(&def).is_err());
    }
}
