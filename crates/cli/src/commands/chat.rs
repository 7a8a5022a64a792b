//! Chat command handler.
//!
//! Reads questions from stdin, one per line, and carries the conversation
//! history forward between them. `/reset` clears the history; `/exit` or
//! end of input stops.

use super::render_response;
use clap::Args;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use yojana_core::{config::AppConfig, AppError, AppResult, ConversationTurn};
use yojana_knowledge::{QueryRequest, SchemeContext};

/// Interactive conversation about government schemes
#[derive(Args, Debug)]
pub struct ChatCommand {
    /// Maximum number of schemes to cite per answer
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Only cite schemes for this state (case-insensitive)
    #[arg(long)]
    pub state: Option<String>,

    /// Only cite schemes in this category (case-insensitive)
    #[arg(long)]
    pub category: Option<String>,
}

/// What to do with one line of input.
#[derive(Debug, PartialEq, Eq)]
enum ChatInput<'a> {
    Skip,
    Exit,
    Reset,
    Question(&'a str),
}

fn classify(line: &str) -> ChatInput<'_> {
    match line.trim() {
        "" => ChatInput::Skip,
        "/exit" | "/quit" => ChatInput::Exit,
        "/reset" => ChatInput::Reset,
        question => ChatInput::Question(question),
    }
}

impl ChatCommand {
    /// Execute the chat command.
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing chat command");

        let context = SchemeContext::load(config).await;
        if !context.is_ready() {
            // Surface the NotReady error before prompting for input
            context.pipeline()?;
        }

        let mut history: Vec<ConversationTurn> = Vec::new();
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        eprintln!("Ask about government schemes. Type /reset to start over, /exit to quit.");

        loop {
            stdout.write_all(b"> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };

            let question = match classify(&line) {
                ChatInput::Skip => continue,
                ChatInput::Exit => break,
                ChatInput::Reset => {
                    history.clear();
                    eprintln!("History cleared.");
                    continue;
                }
                ChatInput::Question(question) => question.to_string(),
            };

            let request = QueryRequest {
                query: question.clone(),
                k: self.k,
                state: self.state.clone(),
                category: self.category.clone(),
                history: history.clone(),
            };

            match context.ask(&request).await {
                Ok(response) => {
                    stdout
                        .write_all(render_response(&response).as_bytes())
                        .await?;
                    history.push(ConversationTurn::user(question));
                    history.push(ConversationTurn::model(response.answer));
                }
                Err(e) => report(&e),
            }
        }

        Ok(ExitCode::SUCCESS)
    }
}

/// Print a failed turn without ending the session.
fn report(error: &AppError) {
    tracing::error!(status = error.status_code(), "Query failed: {}", error);
    eprintln!("error: {}", error.user_message());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_input() {
        assert_eq!(classify("   "), ChatInput::Skip);
        assert_eq!(classify("/exit"), ChatInput::Exit);
        assert_eq!(classify("/quit "), ChatInput::Exit);
        assert_eq!(classify("/reset"), ChatInput::Reset);
        assert_eq!(
            classify("  what about scholarships "),
            ChatInput::Question("what about scholarships")
        );
    }
}
