//! Scheme knowledge and retrieval-augmented answering.
//!
//! Loads the pre-built scheme catalog and vector index, embeds queries,
//! filters candidates by state and category, and grounds LLM answers in
//! the surviving records.
//!
//! # Example
//! ```no_run
//! use yojana_core::AppConfig;
//! use yojana_knowledge::{QueryRequest, SchemeContext};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! let context = SchemeContext::load(&config).await;
//! let response = context
//!     .ask(&QueryRequest::new("help for farmers").with_state("Punjab"))
//!     .await?;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod context;
pub mod embeddings;
pub mod lancedb_index;
pub mod rag;
pub mod retriever;
pub mod vector_index;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use catalog::Catalog;
pub use context::{Component, ComponentStatus, ReadinessReport, ReadinessStatus, SchemeContext};
pub use embeddings::{create_provider, EmbeddingProvider};
pub use rag::{
    AnswerSynthesizer, CandidateFilter, FilterOutcome, LlmSynthesizer, QueryPipeline,
    QueryRequest, QueryResponse, NO_MATCH_MESSAGE,
};
pub use retriever::{RetrievalCandidate, Retriever};
pub use lancedb_index::LanceDbIndex;
pub use vector_index::{Neighbor, VectorIndex};
