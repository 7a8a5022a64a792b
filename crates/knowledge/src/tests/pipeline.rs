//! Query pipeline scenarios.

use super::fakes::{FixedEmbedder, Script, ScriptedLlm, StubIndex};
use crate::catalog::Catalog;
use crate::context::SchemeContext;
use crate::rag::{LlmSynthesizer, QueryRequest, NO_MATCH_MESSAGE};
use crate::vector_index::Neighbor;
use std::sync::Arc;
use yojana_core::config::RetrievalSettings;
use yojana_core::{AppError, ConversationTurn, ErrorClass, SchemeRecord};
use yojana_llm::ChatRole;

const DIM: usize = 4;

struct Harness {
    context: SchemeContext,
    embedder: Arc<FixedEmbedder>,
    index: Arc<StubIndex>,
    llm: Arc<ScriptedLlm>,
}

fn harness(records: Vec<SchemeRecord>, index: StubIndex, script: Script) -> Harness {
    let embedder = Arc::new(FixedEmbedder::new(DIM));
    let index = Arc::new(index);
    let llm = Arc::new(ScriptedLlm::new(script));

    let context = SchemeContext::new(RetrievalSettings::default())
        .with_embedder(embedder.clone())
        .with_index(index.clone())
        .with_catalog(Arc::new(Catalog::from_records(records)))
        .with_synthesizer(Arc::new(LlmSynthesizer::new(llm.clone(), "test-model")));

    Harness {
        context,
        embedder,
        index,
        llm,
    }
}

fn farmer_scheme() -> SchemeRecord {
    SchemeRecord::new("Farmer Support Scheme")
        .with_state("Punjab")
        .with_category("Agriculture")
        .with_text("Income support for farmers")
}

fn mixed_catalog() -> Vec<SchemeRecord> {
    vec![
        SchemeRecord::new("Kerala Fisheries Aid")
            .with_state("Kerala")
            .with_category("Agriculture"),
        SchemeRecord::new("Punjab Crop Insurance")
            .with_state("Punjab")
            .with_category("Agriculture"),
        SchemeRecord::new("Kerala Scholarship")
            .with_state("kerala")
            .with_category("Education"),
        SchemeRecord::new("National Pension").with_category("Social Welfare"),
        SchemeRecord::new("Kerala Housing")
            .with_state("KERALA")
            .with_category("Housing"),
        SchemeRecord::new("Punjab Scholarship")
            .with_state("Punjab")
            .with_category("Education"),
    ]
}

fn titles(schemes: &[SchemeRecord]) -> Vec<&str> {
    schemes.iter().map(|s| s.title.as_str()).collect()
}

#[tokio::test]
async fn single_matching_scheme_is_cited() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::sequential(DIM, 1),
        Script::Answer("### Farmer Support Scheme\n- Income support".to_string()),
    );

    let response = h
        .context
        .ask(&QueryRequest::new("help for farmers").with_k(5))
        .await
        .unwrap();

    assert_eq!(response.schemes, vec![farmer_scheme()]);
    assert_eq!(response.answer, "### Farmer Support Scheme\n- Income support");
    assert_eq!(h.index.requested(), vec![10]);
    assert_eq!(h.llm.calls(), 1);
}

#[tokio::test]
async fn state_filter_without_match_skips_llm() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::sequential(DIM, 1),
        Script::Answer("unused".to_string()),
    );

    let response = h
        .context
        .ask(&QueryRequest::new("help for farmers").with_k(5).with_state("Kerala"))
        .await
        .unwrap();

    assert!(response.schemes.is_empty());
    assert_eq!(response.answer, NO_MATCH_MESSAGE);
    assert_eq!(h.llm.calls(), 0);
}

#[tokio::test]
async fn history_sits_between_context_and_question() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::sequential(DIM, 1),
        Script::Answer("Scholarships...".to_string()),
    );
    let history = vec![
        ConversationTurn::user("I am a student"),
        ConversationTurn::model("Here are some schemes..."),
    ];

    h.context
        .ask(&QueryRequest::new("what about scholarships").with_history(history))
        .await
        .unwrap();

    let request = h.llm.last_request().unwrap();
    let segments: Vec<_> = request
        .messages
        .iter()
        .map(|m| (m.role, m.content.as_str()))
        .collect();

    assert_eq!(segments[0].0, ChatRole::User);
    assert!(segments[0].1.contains("### Scheme: Farmer Support Scheme"));
    assert_eq!(segments[1], (ChatRole::User, "I am a student"));
    assert_eq!(segments[2], (ChatRole::Assistant, "Here are some schemes..."));
    assert_eq!(
        segments[3],
        (ChatRole::User, "### Current Question:\nwhat about scholarships")
    );
    assert_eq!(segments[4], (ChatRole::Assistant, "### Answer:"));
    assert_eq!(segments.len(), 5);
}

#[tokio::test]
async fn safety_block_is_client_error() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::sequential(DIM, 1),
        Script::Blocked,
    );

    let err = h
        .context
        .ask(&QueryRequest::new("help for farmers"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::SafetyBlocked(_)));
    assert_eq!(err.class(), ErrorClass::Client);
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn provider_outage_is_server_error() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::sequential(DIM, 1),
        Script::Unavailable,
    );

    let err = h
        .context
        .ask(&QueryRequest::new("help for farmers"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Synthesis(_)));
    assert_eq!(err.class(), ErrorClass::Server);
    assert!(!err.user_message().contains("connection refused"));
    assert_eq!(h.llm.calls(), 1);
}

#[tokio::test]
async fn dimension_mismatch_never_searches() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::sequential(DIM + 1, 1),
        Script::Answer("unused".to_string()),
    );

    let err = h
        .context
        .ask(&QueryRequest::new("help for farmers"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Embedding(_)));
    assert!(h.index.requested().is_empty());
    assert_eq!(h.llm.calls(), 0);
}

#[tokio::test]
async fn zero_k_returns_no_match_without_work() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::sequential(DIM, 1),
        Script::Answer("unused".to_string()),
    );

    let response = h
        .context
        .ask(&QueryRequest::new("help for farmers").with_k(0))
        .await
        .unwrap();

    assert!(response.is_no_match());
    assert_eq!(response.answer, NO_MATCH_MESSAGE);
    assert_eq!(h.embedder.calls(), 0);
    assert_eq!(h.llm.calls(), 0);
}

#[tokio::test]
async fn blank_query_is_invalid() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::sequential(DIM, 1),
        Script::Answer("unused".to_string()),
    );

    let err = h.context.ask(&QueryRequest::new("   ")).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidRequest(_)));
    assert_eq!(h.embedder.calls(), 0);
}

#[tokio::test]
async fn out_of_bounds_hits_are_dropped() {
    let h = harness(
        vec![farmer_scheme()],
        StubIndex::new(
            DIM,
            vec![
                Neighbor::new(3, 0.1),
                Neighbor::new(0, 0.2),
                Neighbor::new(-1, f32::MAX),
            ],
        ),
        Script::Answer("ok".to_string()),
    );

    let response = h
        .context
        .ask(&QueryRequest::new("help for farmers").with_k(2))
        .await
        .unwrap();

    assert_eq!(titles(&response.schemes), vec!["Farmer Support Scheme"]);
}

#[tokio::test]
async fn filtered_citations_respect_k_and_filters() {
    let h = harness(
        mixed_catalog(),
        StubIndex::sequential(DIM, 6),
        Script::Answer("ok".to_string()),
    );

    let response = h
        .context
        .ask(&QueryRequest::new("schemes in kerala").with_k(2).with_state("Kerala"))
        .await
        .unwrap();

    // Over-fetch 4: ids 0..4, of which ids 0 and 2 are in Kerala
    assert_eq!(h.index.requested(), vec![4]);
    assert_eq!(
        titles(&response.schemes),
        vec!["Kerala Fisheries Aid", "Kerala Scholarship"]
    );
    assert!(response
        .schemes
        .iter()
        .all(|s| s.state.as_deref().map(str::to_lowercase) == Some("kerala".to_string())));
}

#[tokio::test]
async fn category_filter_is_case_insensitive() {
    let h = harness(
        mixed_catalog(),
        StubIndex::sequential(DIM, 6),
        Script::Answer("ok".to_string()),
    );

    let response = h
        .context
        .ask(
            &QueryRequest::new("study help")
                .with_k(3)
                .with_category("EDUCATION"),
        )
        .await
        .unwrap();

    assert_eq!(
        titles(&response.schemes),
        vec!["Kerala Scholarship", "Punjab Scholarship"]
    );
    assert!(response.schemes.len() <= 3);
}

#[tokio::test]
async fn identical_requests_assemble_identical_prompts() {
    let h = harness(
        mixed_catalog(),
        StubIndex::sequential(DIM, 6),
        Script::Answer("ok".to_string()),
    );
    let request = QueryRequest::new("agriculture")
        .with_k(3)
        .with_category("agriculture");

    let first = h.context.ask(&request).await.unwrap();
    let second = h.context.ask(&request).await.unwrap();

    assert_eq!(first, second);
    let requests = h.llm.requests.lock().unwrap();
    assert_eq!(requests[0].messages, requests[1].messages);
}
