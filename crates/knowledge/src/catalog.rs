//! Scheme catalog loading.
//!
//! The catalog is a JSON array aligned with the vector index: entry `i`
//! describes the vector with identifier `i`. Records are never dropped or
//! reordered here.

use serde::Deserialize;
use std::path::Path;
use yojana_core::{AppError, AppResult, SchemeRecord};

/// Title used for catalog entries that lack one.
pub const UNTITLED_SCHEME: &str = "Untitled scheme";

/// Sentinel the offline pipeline writes for missing values.
const MISSING_SENTINEL: &str = "N/A";

/// Catalog entry as written by the offline pipeline.
///
/// Unknown keys (e.g. `original_index`) are ignored.
#[derive(Debug, Deserialize)]
struct RawSchemeRecord {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    department: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default, alias = "description")]
    full_document_text: Option<String>,
}

/// Trim a raw field, mapping empty strings and the sentinel to `None`.
fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != MISSING_SENTINEL)
}

impl RawSchemeRecord {
    fn into_record(self, position: usize) -> SchemeRecord {
        let title = clean(self.title).unwrap_or_else(|| {
            tracing::warn!(position, "Catalog entry has no title");
            UNTITLED_SCHEME.to_string()
        });

        SchemeRecord {
            title,
            link: clean(self.link),
            category: clean(self.category),
            department: clean(self.department),
            state: clean(self.state),
            full_document_text: clean(self.full_document_text),
        }
    }
}

/// Read-only, position-addressed collection of scheme records.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    records: Vec<SchemeRecord>,
}

impl Catalog {
    /// Wrap already-cleaned records.
    pub fn from_records(records: Vec<SchemeRecord>) -> Self {
        Self { records }
    }

    /// Load the catalog artifact from disk.
    pub fn load(path: &Path) -> AppResult<Self> {
        tracing::debug!("Loading scheme catalog from {:?}", path);

        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Knowledge(format!("Failed to read catalog {:?}: {}", path, e))
        })?;

        let catalog = Self::from_json(&contents)
            .map_err(|e| AppError::Knowledge(format!("Invalid catalog {:?}: {}", path, e)))?;

        tracing::info!(records = catalog.len(), "Loaded scheme catalog");

        Ok(catalog)
    }

    /// Parse a catalog from its JSON text.
    pub fn from_json(json: &str) -> AppResult<Self> {
        let raw: Vec<RawSchemeRecord> = serde_json::from_str(json)?;
        let records = raw
            .into_iter()
            .enumerate()
            .map(|(position, entry)| entry.into_record(position))
            .collect();

        Ok(Self { records })
    }

    /// Look up a record by index identifier.
    ///
    /// Negative and out-of-range identifiers yield `None`.
    pub fn get(&self, id: i64) -> Option<&SchemeRecord> {
        usize::try_from(id).ok().and_then(|i| self.records.get(i))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_sentinels_become_none() {
        let catalog = Catalog::from_json(
            r#"[{
                "original_index": 0,
                "title": "Farmer Support Scheme",
                "link": "N/A",
                "category": "Agriculture",
                "department": "",
                "state": " Punjab ",
                "full_document_text": "Income support"
            }]"#,
        )
        .unwrap();

        let record = catalog.get(0).unwrap();
        assert_eq!(record.title, "Farmer Support Scheme");
        assert_eq!(record.link, None);
        assert_eq!(record.department, None);
        assert_eq!(record.state.as_deref(), Some("Punjab"));
        assert_eq!(record.full_document_text.as_deref(), Some("Income support"));
    }

    #[test]
    fn test_missing_title_keeps_position() {
        let catalog = Catalog::from_json(
            r#"[{"title": "N/A", "state": "Kerala"}, {"title": "Second"}]"#,
        )
        .unwrap();

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().title, UNTITLED_SCHEME);
        assert_eq!(catalog.get(1).unwrap().title, "Second");
    }

    #[test]
    fn test_description_alias() {
        let catalog =
            Catalog::from_json(r#"[{"title": "Scholarship", "description": "For students"}]"#)
                .unwrap();
        assert_eq!(
            catalog.get(0).unwrap().full_document_text.as_deref(),
            Some("For students")
        );
    }

    #[test]
    fn test_get_out_of_bounds() {
        let catalog = Catalog::from_records(vec![SchemeRecord::new("Only")]);
        assert!(catalog.get(0).is_some());
        assert!(catalog.get(1).is_none());
        assert!(catalog.get(-1).is_none());
    }

    #[test]
    fn test_load_from_disk() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"[{"title": "A"}, {"title": "B"}]"#).unwrap();

        let catalog = Catalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_load_rejects_non_array() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"title": "A"}"#).unwrap();

        let err = Catalog::load(file.path()).unwrap_err();
        assert!(matches!(err, AppError::Knowledge(_)));
    }
}
