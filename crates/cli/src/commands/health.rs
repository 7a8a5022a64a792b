//! Health command handler.
//!
//! Loads every dependency the way a query would and reports which ones
//! are available. Exits non-zero when the service is degraded.

use clap::Args;
use std::process::ExitCode;
use yojana_core::{config::AppConfig, AppResult};
use yojana_knowledge::{ReadinessReport, ReadinessStatus, SchemeContext};

/// Report whether every dependency is loaded
#[derive(Args, Debug)]
pub struct HealthCommand {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

impl HealthCommand {
    pub async fn execute(&self, config: &AppConfig) -> AppResult<ExitCode> {
        tracing::info!("Executing health command");

        let report = SchemeContext::load(config).await.readiness();

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print!("{}", render_report(&report));
        }

        Ok(match report.status {
            ReadinessStatus::Ready => ExitCode::SUCCESS,
            ReadinessStatus::Degraded => ExitCode::FAILURE,
        })
    }
}

fn render_report(report: &ReadinessReport) -> String {
    let status = match report.status {
        ReadinessStatus::Ready => "ready",
        ReadinessStatus::Degraded => "degraded",
    };
    let mut out = format!("Status: {} ({})\n", status, report.status_code());

    for (component, state) in &report.components {
        let mark = if state.loaded { "loaded" } else { "not loaded" };
        out.push_str(&format!("  {:<20} {}", component.as_str(), mark));
        if let Some(ref error) = state.error {
            out.push_str(&format!(": {}", error));
        }
        out.push('\n');
    }

    let count = |n: Option<usize>| n.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());
    out.push_str(&format!("  index vectors:       {}\n", count(report.index_count)));
    out.push_str(&format!("  catalog records:     {}\n", count(report.catalog_count)));

    out
}
