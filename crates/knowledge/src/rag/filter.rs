//! Metadata filtering of retrieval candidates.

use crate::retriever::RetrievalCandidate;
use serde::{Deserialize, Serialize};
use yojana_core::SchemeRecord;

/// Result of the filter stage. An empty result is a value, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    Found(Vec<SchemeRecord>),
    NoMatch,
}

/// State and category constraints on cited schemes.
///
/// Matching is exact but case-insensitive. A record that lacks a filtered
/// field never matches that filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFilter {
    pub state: Option<String>,
    pub category: Option<String>,
}

/// Trim and lowercase a filter value.
///
/// Empty and whitespace-only values mean "no filter" rather than a filter
/// that nothing can match, so `Some("  ")` behaves like `None`.
fn normalize(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_lowercase)
}

fn field_matches(field: &Option<String>, wanted: &Option<String>) -> bool {
    match wanted {
        None => true,
        Some(wanted) => field
            .as_deref()
            .map(|value| value.trim().to_lowercase() == *wanted)
            .unwrap_or(false),
    }
}

impl CandidateFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from optional request values.
    pub fn from_request(state: Option<&str>, category: Option<&str>) -> Self {
        Self {
            state: normalize(state),
            category: normalize(category),
        }
    }

    pub fn with_state(mut self, state: &str) -> Self {
        self.state = normalize(Some(state));
        self
    }

    pub fn with_category(mut self, category: &str) -> Self {
        self.category = normalize(Some(category));
        self
    }

    /// Check if any filters are set
    pub fn has_filters(&self) -> bool {
        self.state.is_some() || self.category.is_some()
    }

    pub fn matches(&self, record: &SchemeRecord) -> bool {
        field_matches(&record.state, &self.state)
            && field_matches(&record.category, &self.category)
    }

    /// Keep matching candidates in retrieval order, then truncate to `k`.
    pub fn apply(&self, candidates: Vec<RetrievalCandidate>, k: usize) -> FilterOutcome {
        let before = candidates.len();
        let mut records: Vec<SchemeRecord> = candidates
            .into_iter()
            .map(|candidate| candidate.record)
            .filter(|record| self.matches(record))
            .collect();
        records.truncate(k);

        tracing::debug!(
            before,
            after = records.len(),
            state = ?self.state,
            category = ?self.category,
            "Filtered candidates"
        );

        if records.is_empty() {
            FilterOutcome::NoMatch
        } else {
            FilterOutcome::Found(records)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(record: SchemeRecord, distance: f32) -> RetrievalCandidate {
        RetrievalCandidate { record, distance }
    }

    fn candidates() -> Vec<RetrievalCandidate> {
        vec![
            candidate(
                SchemeRecord::new("Kerala Farm Aid")
                    .with_state("Kerala")
                    .with_category("Agriculture"),
                0.1,
            ),
            candidate(
                SchemeRecord::new("Punjab Farm Aid")
                    .with_state("Punjab")
                    .with_category("Agriculture"),
                0.2,
            ),
            candidate(SchemeRecord::new("No State Scheme").with_category("Agriculture"), 0.3),
            candidate(
                SchemeRecord::new("Kerala Scholarship")
                    .with_state("KERALA")
                    .with_category("Education"),
                0.4,
            ),
        ]
    }

    fn titles(outcome: &FilterOutcome) -> Vec<&str> {
        match outcome {
            FilterOutcome::Found(records) => records.iter().map(|r| r.title.as_str()).collect(),
            FilterOutcome::NoMatch => Vec::new(),
        }
    }

    #[test]
    fn test_state_filter_is_case_insensitive() {
        let outcome = CandidateFilter::new().with_state("kerala").apply(candidates(), 10);
        assert_eq!(titles(&outcome), vec!["Kerala Farm Aid", "Kerala Scholarship"]);
    }

    #[test]
    fn test_filters_combine() {
        let outcome = CandidateFilter::new()
            .with_state("Kerala")
            .with_category("education")
            .apply(candidates(), 10);
        assert_eq!(titles(&outcome), vec!["Kerala Scholarship"]);
    }

    #[test]
    fn test_missing_field_fails_filter() {
        let outcome = CandidateFilter::new()
            .with_category("Agriculture")
            .with_state("Punjab")
            .apply(candidates(), 10);
        assert_eq!(titles(&outcome), vec!["Punjab Farm Aid"]);
    }

    #[test]
    fn test_truncates_after_filtering() {
        let outcome = CandidateFilter::new()
            .with_category("agriculture")
            .apply(candidates(), 2);
        assert_eq!(titles(&outcome), vec!["Kerala Farm Aid", "Punjab Farm Aid"]);
    }

    #[test]
    fn test_no_survivors_is_no_match() {
        let outcome = CandidateFilter::new().with_state("Goa").apply(candidates(), 5);
        assert_eq!(outcome, FilterOutcome::NoMatch);
    }

    #[test]
    fn test_zero_k_is_no_match() {
        let outcome = CandidateFilter::new().apply(candidates(), 0);
        assert_eq!(outcome, FilterOutcome::NoMatch);
    }

    #[test]
    fn test_blank_filters_are_absent() {
        let filter = CandidateFilter::from_request(Some("  "), Some(""));
        assert!(!filter.has_filters());
        assert_eq!(titles(&filter.apply(candidates(), 10)).len(), 4);
    }

    #[test]
    fn test_filtering_matching_set_is_noop() {
        let filter = CandidateFilter::new().with_state("kerala");
        let first = match filter.apply(candidates(), 10) {
            FilterOutcome::Found(records) => records,
            FilterOutcome::NoMatch => panic!("expected matches"),
        };

        let again: Vec<_> = first
            .iter()
            .cloned()
            .map(|record| candidate(record, 0.0))
            .collect();
        assert_eq!(filter.apply(again, 10), FilterOutcome::Found(first));
    }
}
