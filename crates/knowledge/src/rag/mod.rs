//! Retrieval-augmented answering over the scheme catalog.

pub mod ask;
pub mod filter;
pub mod synthesizer;
pub mod types;

pub use ask::QueryPipeline;
pub use filter::{CandidateFilter, FilterOutcome};
pub use synthesizer::{AnswerSynthesizer, LlmSynthesizer};
pub use types::{QueryRequest, QueryResponse, NO_MATCH_MESSAGE};
