//! Query embedding providers.
//!
//! The provider must be the same model the offline pipeline used to build
//! the vector index; dimensions are checked against the index at query time.

pub mod provider;
pub mod providers;

pub use provider::{create_provider, EmbeddingProvider};
