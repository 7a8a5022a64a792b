//! Deterministic hashed-trigram embeddings for tests and demos.

use crate::embeddings::provider::EmbeddingProvider;
use std::collections::HashMap;
use yojana_core::AppResult;

/// Words too common to help tell schemes apart.
const STOP_WORDS: [&str; 20] = [
    "the", "for", "and", "are", "was", "with", "from", "this", "that", "have", "has", "its",
    "their", "they", "what", "about", "any", "can", "who", "how",
];

/// Mock provider for testing and development.
///
/// Vectors depend only on the text, so identical queries always embed
/// identically. Not semantic: related words share trigrams, nothing more.
#[derive(Debug)]
pub struct MockProvider {
    dimensions: usize,
}

impl MockProvider {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn bucket(&self, token: &str, seed: u64) -> usize {
        let hash = token
            .bytes()
            .fold(0u64, |acc, b| acc.wrapping_mul(seed).wrapping_add(b as u64));
        (hash % self.dimensions as u64) as usize
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let lower = text.to_lowercase();
        let mut frequencies: HashMap<&str, u32> = HashMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *frequencies.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &frequencies {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                embedding[self.bucket(&trigram, 37)] += (*freq as f32).sqrt();
            }
            embedding[self.bucket(word, 31)] += *freq as f32;
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            embedding.iter_mut().for_each(|v| *v /= norm);
        }

        embedding
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for MockProvider {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model_name(&self) -> &str {
        "hashed-trigram"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
