//! Query orchestration.
//!
//! Stages: embed and search (over-fetching), filter and truncate, then
//! either the fixed no-match answer or prompt assembly and synthesis.
//! Any stage may stop the query with a typed error; nothing is retried.

use crate::rag::filter::{CandidateFilter, FilterOutcome};
use crate::rag::synthesizer::AnswerSynthesizer;
use crate::rag::types::{QueryRequest, QueryResponse};
use crate::retriever::Retriever;
use std::sync::Arc;
use tracing::Instrument;
use yojana_core::config::RetrievalSettings;
use yojana_core::{AppError, AppResult};
use yojana_prompt::{assemble, AssembleOptions, PromptDefinition};

/// Everything one query needs, assembled from a ready context.
#[derive(Clone)]
pub struct QueryPipeline {
    retriever: Retriever,
    prompt: Arc<PromptDefinition>,
    synthesizer: Arc<dyn AnswerSynthesizer>,
    settings: RetrievalSettings,
}

impl QueryPipeline {
    pub fn new(
        retriever: Retriever,
        prompt: Arc<PromptDefinition>,
        synthesizer: Arc<dyn AnswerSynthesizer>,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            retriever,
            prompt,
            synthesizer,
            settings,
        }
    }

    /// Answer one question.
    ///
    /// Runs inside a `query` span carrying a fresh request id.
    pub async fn ask(&self, request: &QueryRequest) -> AppResult<QueryResponse> {
        let request_id = uuid::Uuid::new_v4();
        let span = tracing::info_span!("query", %request_id);
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &QueryRequest) -> AppResult<QueryResponse> {
        let query = request.query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest(
                "Query text must not be empty".to_string(),
            ));
        }

        let k = request.k.unwrap_or(self.settings.default_k);
        let filter =
            CandidateFilter::from_request(request.state.as_deref(), request.category.as_deref());

        tracing::info!(
            k,
            state = ?filter.state,
            category = ?filter.category,
            history = request.history.len(),
            "Received query"
        );

        if k == 0 {
            tracing::info!("k is zero; returning no-match response");
            return Ok(QueryResponse::no_match());
        }

        let overfetch = k.saturating_mul(self.settings.overfetch_factor.max(1));
        tracing::debug!(overfetch, "Stage: retrieving");
        let candidates = self.retriever.retrieve(query, overfetch).await?;

        tracing::debug!(
            candidates = candidates.len(),
            filtered = filter.has_filters(),
            "Stage: filtering"
        );
        let records = match filter.apply(candidates, k) {
            FilterOutcome::Found(records) => records,
            FilterOutcome::NoMatch => {
                tracing::info!("No scheme matched the query and filters");
                return Ok(QueryResponse::no_match());
            }
        };

        tracing::debug!(records = records.len(), "Stage: building prompt");
        let prompt = assemble(
            &self.prompt,
            &records,
            &request.history,
            query,
            AssembleOptions {
                answer_primer: self.settings.answer_primer,
            },
        )?;

        tracing::debug!(synthesizer = self.synthesizer.name(), "Stage: synthesizing");
        let answer = self.synthesizer.synthesize(&prompt).await?;

        tracing::info!(cited = records.len(), "Query answered");

        Ok(QueryResponse::new(answer, records))
    }
}
