//! Yojana CLI
//!
//! Main entry point for the `yojana` command-line tool: ask questions about
//! government welfare schemes, chat with history, and probe readiness.

mod commands;

use clap::{Parser, Subcommand};
use commands::{AskCommand, ChatCommand, HealthCommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Instrument;
use yojana_core::config::{AppConfig, ConfigOverrides};
use yojana_core::logging;

/// Yojana - find government welfare schemes that fit you
#[derive(Parser, Debug)]
#[command(name = "yojana")]
#[command(about = "Grounded answers about government welfare schemes", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to workspace directory (default: current directory)
    #[arg(short, long, global = true, env = "YOJANA_WORKSPACE")]
    workspace: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "YOJANA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (ollama, gemini)
    #[arg(short, long, global = true, env = "YOJANA_PROVIDER")]
    provider: Option<String>,

    /// Answer model identifier
    #[arg(short, long, global = true, env = "YOJANA_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ask one question about schemes
    Ask(AskCommand),

    /// Interactive conversation that keeps history
    Chat(ChatCommand),

    /// Report whether every dependency is loaded
    Health(HealthCommand),
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let overrides = ConfigOverrides {
        workspace: cli.workspace,
        config_file: cli.config,
        provider: cli.provider,
        model: cli.model,
        log_level: cli.log_level,
        verbose: cli.verbose,
        no_color: cli.no_color,
    };

    let config = match AppConfig::load_with(&overrides) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) =
        logging::init_logging(config.log_level.as_deref(), config.no_color, config.json_logs)
    {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    tracing::info!("Yojana CLI starting");
    tracing::debug!("Workspace: {:?}", config.workspace);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    if let Err(e) = config.validate() {
        tracing::warn!("Configuration problem: {}", e);
    }

    let command_name = match &cli.command {
        Commands::Ask(_) => "ask",
        Commands::Chat(_) => "chat",
        Commands::Health(_) => "health",
    };
    let span = tracing::info_span!("command", name = command_name);

    let result = async {
        match cli.command {
            Commands::Ask(cmd) => cmd.execute(&config).await,
            Commands::Chat(cmd) => cmd.execute(&config).await,
            Commands::Health(cmd) => cmd.execute(&config).await,
        }
    }
    .instrument(span)
    .await;

    match result {
        Ok(code) => {
            tracing::info!("Command completed");
            code
        }
        Err(e) => {
            tracing::error!(status = e.status_code(), "Command failed: {}", e);
            eprintln!("error: {}", e.user_message());
            ExitCode::FAILURE
        }
    }
}
