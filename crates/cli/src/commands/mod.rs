//! Command handlers for the Yojana CLI.

pub mod ask;
pub mod chat;
pub mod health;

pub use ask::AskCommand;
pub use chat::ChatCommand;
pub use health::HealthCommand;

use yojana_knowledge::QueryResponse;

/// Render an answer and its cited schemes for the terminal.
pub(crate) fn render_response(response: &QueryResponse) -> String {
    let mut out = String::new();
    out.push_str(response.answer.trim_end());
    out.push('\n');

    if !response.schemes.is_empty() {
        out.push_str("\nSchemes cited:\n");
        for (i, scheme) in response.schemes.iter().enumerate() {
            out.push_str(&format!("  {}. {}", i + 1, scheme.title));
            let details: Vec<&str> = [scheme.state.as_deref(), scheme.category.as_deref()]
                .into_iter()
                .flatten()
                .collect();
            if !details.is_empty() {
                out.push_str(&format!(" ({})", details.join(", ")));
            }
            out.push('\n');
            if let Some(ref link) = scheme.link {
                out.push_str(&format!("     {}\n", link));
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use yojana_core::SchemeRecord;

    #[test]
    fn test_render_response_lists_schemes() {
        let response = QueryResponse::new(
            "### PM-KISAN\n- Income support\n\n".to_string(),
            vec![
                SchemeRecord::new("PM-KISAN")
                    .with_state("All India")
                    .with_category("Agriculture")
                    .with_link("https://pmkisan.gov.in"),
                SchemeRecord::new("Local Grant"),
            ],
        );

        let rendered = render_response(&response);
        assert!(rendered.starts_with("### PM-KISAN\n- Income support\n\nSchemes cited:"));
        assert!(rendered.contains("  1. PM-KISAN (All India, Agriculture)\n     https://pmkisan.gov.in\n"));
        assert!(rendered.contains("  2. Local Grant\n"));
    }

    #[test]
    fn test_render_no_match() {
        let rendered = render_response(&QueryResponse::no_match());
        assert!(!rendered.contains("Schemes cited"));
    }
}
