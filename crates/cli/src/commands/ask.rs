//! Ask command handler.
//!
//! Answers one question, optionally continuing a conversation saved as a
//! JSON array of `{"role": "user" | "model", "content": ...}` turns.

use super::render_response;
use clap::Args;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use yojana_core::{config::AppConfig, AppError, AppResult, ConversationTurn};
use yojana_knowledge::{QueryRequest, SchemeContext};

/// Ask one question about government schemes
#[derive(Args, Debug)]
pub struct AskCommand {
    /// The question to ask
    pub question: String,

    /// Maximum number of schemes to cite
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Only cite schemes for this state (case-insensitive)
    #[arg(long)]
    pub state: Option<String>,

    /// Only cite schemes in this category (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,

    /// JSON file with prior conversation turns
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl AskCommand {
    /// Execute the ask command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing ask command");
        tracing::debug!("Ask command options: {:?}", self);

        let history = match self.history {
            Some(ref path) => load_history(path)?,
            None => Vec::new(),
        };

        let request = QueryRequest {
            query: self.question.clone(),
            k: self.k,
            state: self.state.clone(),
            category: self.category.clone(),
            history,
        };

        let context = SchemeContext::load(config).await;
        let response = context.ask(&request).await?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&response)?);
        } else {
            print!("{}", render_response(&response));
        }

        Ok(ExitCode::SUCCESS)
    }
}

/// Read conversation history from a JSON file.
fn load_history(path: &Path) -> AppResult<Vec<ConversationTurn>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        AppError::InvalidRequest(format!("Cannot read history file {:?}: {}", path, e))
    })?;

    serde_json::from_str(&contents).map_err(|e| {
        AppError::InvalidRequest(format!("Invalid history file {:?}: {}", path, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;
    use yojana_core::TurnRole;

    #[test]
    fn test_load_history() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            r#"[{"role": "user", "content": "I am a student"},
                {"role": "model", "content": "Here are some schemes..."}]"#,
        )
        .unwrap();

        let history = load_history(file.path()).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].role, TurnRole::Model);
    }

    #[test]
    fn test_load_history_rejects_unknown_role() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"[{"role": "system", "content": "x"}]"#).unwrap();

        let err = load_history(file.path()).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_load_history_missing_file() {
        let err = load_history(Path::new("/nonexistent/history.json")).unwrap_err();
        assert!(matches!(err, AppError::InvalidRequest(_)));
    }
}
