//! Nearest-neighbor retrieval of scheme records.

use crate::catalog::Catalog;
use crate::embeddings::EmbeddingProvider;
use crate::vector_index::VectorIndex;
use std::sync::Arc;
use yojana_core::{AppError, AppResult, SchemeRecord};

/// A catalog record paired with its distance to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalCandidate {
    pub record: SchemeRecord,
    pub distance: f32,
}

/// Embeds queries and maps index hits back to catalog records.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    catalog: Arc<Catalog>,
}

impl Retriever {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        index: Arc<dyn VectorIndex>,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            embedder,
            index,
            catalog,
        }
    }

    /// Retrieve up to `count` candidates, ascending by distance.
    ///
    /// Identifiers that do not resolve to a catalog record are logged and
    /// skipped. An embedding whose dimension differs from the index is an
    /// `AppError::Embedding` and no search is attempted.
    pub async fn retrieve(&self, query: &str, count: usize) -> AppResult<Vec<RetrievalCandidate>> {
        if count == 0 {
            return Ok(Vec::new());
        }

        let embedding = self.embedder.embed(query).await.map_err(|e| match e {
            AppError::Embedding(msg) => AppError::Embedding(msg),
            other => AppError::Embedding(other.to_string()),
        })?;

        if embedding.len() != self.index.dimension() {
            return Err(AppError::Embedding(format!(
                "Query embedding has dimension {} but the index expects {} (model '{}')",
                embedding.len(),
                self.index.dimension(),
                self.embedder.model_name()
            )));
        }

        tracing::debug!(count, "Searching vector index");
        let neighbors = self.index.search(&embedding, count).await?;

        let mut candidates = Vec::with_capacity(neighbors.len());
        for neighbor in neighbors {
            match self.catalog.get(neighbor.id) {
                Some(record) => candidates.push(RetrievalCandidate {
                    record: record.clone(),
                    distance: neighbor.distance,
                }),
                None => tracing::warn!(
                    id = neighbor.id,
                    catalog_len = self.catalog.len(),
                    "Index returned an identifier outside the catalog; skipping"
                ),
            }
        }

        tracing::debug!(candidates = candidates.len(), "Retrieved candidates");

        Ok(candidates)
    }
}
