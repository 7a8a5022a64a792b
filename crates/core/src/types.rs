//! Shared domain types.

use serde::{Deserialize, Serialize};

/// A government scheme as served from the catalog.
///
/// Every optional field uses `None` as its single "absent" representation;
/// sentinel strings are converted at the catalog-loading boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemeRecord {
    pub title: String,

    #[serde(default)]
    pub link: Option<String>,

    #[serde(default)]
    pub category: Option<String>,

    #[serde(default)]
    pub department: Option<String>,

    #[serde(default)]
    pub state: Option<String>,

    /// Full descriptive text of the scheme
    #[serde(default)]
    pub full_document_text: Option<String>,
}

impl SchemeRecord {
    /// Create a record with only a title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: None,
            category: None,
            department: None,
            state: None,
            full_document_text: None,
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = Some(link.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.full_document_text = Some(text.into());
        self
    }
}

/// Speaker of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One prior exchange in a conversation.
///
/// History is owned by the caller and passed unmodified on every query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Model,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_role_wire_names() {
        let turns: Vec<ConversationTurn> = serde_json::from_str(
            r#"[{"role":"user","content":"I am a student"},{"role":"model","content":"Here are some schemes..."}]"#,
        )
        .unwrap();

        assert_eq!(turns[0], ConversationTurn::user("I am a student"));
        assert_eq!(turns[1].role, TurnRole::Model);
    }

    #[test]
    fn test_record_missing_optionals_deserialize_as_none() {
        let record: SchemeRecord =
            serde_json::from_str(r#"{"title":"Farmer Support Scheme"}"#).unwrap();
        assert_eq!(record, SchemeRecord::new("Farmer Support Scheme"));
    }
}
