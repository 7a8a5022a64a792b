//! Query request and response types.

use serde::{Deserialize, Serialize};
use yojana_core::{ConversationTurn, SchemeRecord};

/// Answer returned when no record survives retrieval and filtering.
pub const NO_MATCH_MESSAGE: &str = "I couldn't find any relevant schemes in the database based on your query and filters. Please try rephrasing your question or adjusting the filters.";

/// One question about government schemes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryRequest {
    /// Free-text question; must not be blank
    pub query: String,

    /// Maximum number of schemes to cite; configured default when absent
    #[serde(default)]
    pub k: Option<usize>,

    #[serde(default)]
    pub state: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    /// Prior turns, oldest first
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = Some(k);
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationTurn>) -> Self {
        self.history = history;
        self
    }
}

/// The answer plus the records it was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,

    /// Cited schemes in retrieval order
    pub schemes: Vec<SchemeRecord>,
}

impl QueryResponse {
    pub fn new(answer: String, schemes: Vec<SchemeRecord>) -> Self {
        Self { answer, schemes }
    }

    /// The fixed response for an empty result set.
    pub fn no_match() -> Self {
        Self {
            answer: NO_MATCH_MESSAGE.to_string(),
            schemes: Vec::new(),
        }
    }

    pub fn is_no_match(&self) -> bool {
        self.schemes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_match_response() {
        let response = QueryResponse::no_match();
        assert_eq!(response.answer, NO_MATCH_MESSAGE);
        assert!(response.is_no_match());
    }

    #[test]
    fn test_request_deserializes_with_defaults() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"query": "help for farmers"}"#).unwrap();
        assert_eq!(request.k, None);
        assert!(request.history.is_empty());
    }

    #[test]
    fn test_response_serialization_omits_nothing() {
        let response = QueryResponse::new(
            "PM-KISAN".to_string(),
            vec![SchemeRecord::new("PM-KISAN").with_state("All India")],
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["schemes"][0]["title"], "PM-KISAN");
        assert!(json["schemes"][0]["link"].is_null());
    }
}
