//! Shared, read-only query context and readiness reporting.
//!
//! Dependencies are loaded once at startup. A dependency that fails to
//! load is recorded, not fatal: the context still answers readiness
//! probes, and every query against it fails with `AppError::NotReady`.

use crate::catalog::Catalog;
use crate::embeddings::{create_provider, EmbeddingProvider};
use crate::rag::{AnswerSynthesizer, LlmSynthesizer, QueryPipeline, QueryRequest, QueryResponse};
use crate::retriever::Retriever;
use crate::lancedb_index::LanceDbIndex;
use crate::vector_index::VectorIndex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use yojana_core::config::RetrievalSettings;
use yojana_core::{AppConfig, AppError, AppResult};
use yojana_prompt::{builtin_answer_prompt, load_answer_prompt, PromptDefinition};

/// Default timeout for LLM requests.
const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;

/// A dependency the query path cannot run without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Component {
    EmbeddingProvider,
    VectorIndex,
    Catalog,
    LlmProvider,
}

impl Component {
    pub const ALL: [Component; 4] = [
        Component::EmbeddingProvider,
        Component::VectorIndex,
        Component::Catalog,
        Component::LlmProvider,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Component::EmbeddingProvider => "embedding_provider",
            Component::VectorIndex => "vector_index",
            Component::Catalog => "catalog",
            Component::LlmProvider => "llm_provider",
        }
    }
}

/// Overall readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessStatus {
    Ready,
    Degraded,
}

/// Load state of one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentStatus {
    pub loaded: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Readiness probe result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadinessReport {
    pub status: ReadinessStatus,
    pub components: BTreeMap<Component, ComponentStatus>,
    pub index_count: Option<usize>,
    pub catalog_count: Option<usize>,
}

impl ReadinessReport {
    /// HTTP-equivalent status: 200 when ready, 503 otherwise.
    pub fn status_code(&self) -> u16 {
        match self.status {
            ReadinessStatus::Ready => 200,
            ReadinessStatus::Degraded => 503,
        }
    }
}

/// Immutable set of loaded dependencies, shared by every query.
#[derive(Clone)]
pub struct SchemeContext {
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    index: Option<Arc<dyn VectorIndex>>,
    catalog: Option<Arc<Catalog>>,
    synthesizer: Option<Arc<dyn AnswerSynthesizer>>,
    prompt: Arc<PromptDefinition>,
    settings: RetrievalSettings,
    failures: BTreeMap<Component, String>,
}

impl SchemeContext {
    /// Empty context with the built-in prompt; add dependencies with the
    /// `with_*` builders.
    pub fn new(settings: RetrievalSettings) -> Self {
        Self {
            embedder: None,
            index: None,
            catalog: None,
            synthesizer: None,
            prompt: Arc::new(builtin_answer_prompt()),
            settings,
            failures: BTreeMap::new(),
        }
    }

    pub fn with_embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self.failures.remove(&Component::EmbeddingProvider);
        self
    }

    pub fn with_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.index = Some(index);
        self.failures.remove(&Component::VectorIndex);
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.catalog = Some(catalog);
        self.failures.remove(&Component::Catalog);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn AnswerSynthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self.failures.remove(&Component::LlmProvider);
        self
    }

    pub fn with_prompt(mut self, prompt: PromptDefinition) -> Self {
        self.prompt = Arc::new(prompt);
        self
    }

    fn record_failure(&mut self, component: Component, error: &AppError) {
        tracing::error!(
            component = component.as_str(),
            error = %error,
            "Failed to load dependency"
        );
        self.failures.insert(component, error.to_string());
    }

    /// Load every dependency named by the configuration.
    ///
    /// Never fails; see `readiness` for what did not load.
    pub async fn load(config: &AppConfig) -> Self {
        let mut context = Self::new(config.retrieval.clone());

        match load_answer_prompt(&config.workspace) {
            Ok(prompt) => context = context.with_prompt(prompt),
            Err(e) => tracing::error!(error = %e, "Invalid prompt override; using built-in prompt"),
        }

        match create_provider(&config.embedding) {
            Ok(embedder) => context = context.with_embedder(embedder),
            Err(e) => context.record_failure(Component::EmbeddingProvider, &e),
        }

        match LanceDbIndex::open(&config.index_path(), &config.data.index_table).await {
            Ok(index) => context = context.with_index(Arc::new(index)),
            Err(e) => context.record_failure(Component::VectorIndex, &e),
        }

        match Catalog::load(&config.catalog_path()) {
            Ok(catalog) => context = context.with_catalog(Arc::new(catalog)),
            Err(e) => context.record_failure(Component::Catalog, &e),
        }

        match create_synthesizer(config) {
            Ok(synthesizer) => context = context.with_synthesizer(synthesizer),
            Err(e) => context.record_failure(Component::LlmProvider, &e),
        }

        context.check_alignment();
        context
    }

    /// Warn when the index and catalog disagree on size.
    fn check_alignment(&self) {
        if let (Some(index), Some(catalog)) = (&self.index, &self.catalog) {
            if index.len() != catalog.len() {
                tracing::warn!(
                    index_count = index.len(),
                    catalog_count = catalog.len(),
                    "Vector index and catalog sizes differ; unmatched hits will be skipped"
                );
            }
        }
    }

    fn loaded(&self, component: Component) -> bool {
        match component {
            Component::EmbeddingProvider => self.embedder.is_some(),
            Component::VectorIndex => self.index.is_some(),
            Component::Catalog => self.catalog.is_some(),
            Component::LlmProvider => self.synthesizer.is_some(),
        }
    }

    pub fn is_ready(&self) -> bool {
        Component::ALL.iter().all(|c| self.loaded(*c))
    }

    /// Per-dependency load state plus artifact sizes.
    pub fn readiness(&self) -> ReadinessReport {
        let components = Component::ALL
            .iter()
            .map(|component| {
                let status = ComponentStatus {
                    loaded: self.loaded(*component),
                    error: self.failures.get(component).cloned(),
                };
                (*component, status)
            })
            .collect();

        ReadinessReport {
            status: if self.is_ready() {
                ReadinessStatus::Ready
            } else {
                ReadinessStatus::Degraded
            },
            components,
            index_count: self.index.as_ref().map(|index| index.len()),
            catalog_count: self.catalog.as_ref().map(|catalog| catalog.len()),
        }
    }

    /// Build the query pipeline, or `NotReady` naming what is missing.
    pub fn pipeline(&self) -> AppResult<QueryPipeline> {
        match (&self.embedder, &self.index, &self.catalog, &self.synthesizer) {
            (Some(embedder), Some(index), Some(catalog), Some(synthesizer)) => {
                Ok(QueryPipeline::new(
                    Retriever::new(embedder.clone(), index.clone(), catalog.clone()),
                    self.prompt.clone(),
                    synthesizer.clone(),
                    self.settings.clone(),
                ))
            }
            _ => {
                let missing: Vec<&str> = Component::ALL
                    .iter()
                    .filter(|c| !self.loaded(**c))
                    .map(|c| c.as_str())
                    .collect();
                Err(AppError::NotReady(format!(
                    "missing dependencies: {}",
                    missing.join(", ")
                )))
            }
        }
    }

    /// Answer one question against this context.
    pub async fn ask(&self, request: &QueryRequest) -> AppResult<QueryResponse> {
        self.pipeline()?.ask(request).await
    }
}

/// Create the configured LLM client and wrap it as a synthesizer.
fn create_synthesizer(config: &AppConfig) -> AppResult<Arc<dyn AnswerSynthesizer>> {
    let provider_config = config.get_provider_config(&config.provider);
    let endpoint = provider_config.and_then(|pc| pc.endpoint());
    let timeout = Duration::from_secs(
        provider_config
            .and_then(|pc| pc.timeout_secs())
            .unwrap_or(DEFAULT_LLM_TIMEOUT_SECS),
    );
    let api_key = config.resolve_api_key(&config.provider);

    let client = yojana_llm::create_client(&config.provider, endpoint, api_key.as_deref(), timeout)
        .map_err(|e| AppError::Llm(format!("Failed to create LLM client: {}", e)))?;

    tracing::info!(
        provider = %config.provider,
        model = %config.model,
        "LLM client ready"
    );

    Ok(Arc::new(
        LlmSynthesizer::new(client, config.model.clone())
            .with_temperature(config.retrieval.temperature)
            .with_max_tokens(config.retrieval.max_tokens),
    ))
}
