//! Embedding generation for semantic search and retrieval.

mod openai;

pub use openai::OpenAIEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for embedding generation.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, in input order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Name of the embedding model, recorded alongside the index.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Embedder;
    use crate::error::Result;
    use async_trait::async_trait;

    /// Deterministic embedder with one dimension per keyword.
    ///
    /// Each dimension counts case-insensitive occurrences of its keyword. A
    /// trailing constant dimension keeps every vector non-zero.
    pub struct KeywordEmbedder {
        keywords: Vec<String>,
    }

    impl KeywordEmbedder {
        pub fn new(keywords: &[&str]) -> Self {
            Self {
                keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
            }
        }

        fn vector(&self, text: &str) -> Vec<f32> {
            let lower = text.to_lowercase();
            let mut vector: Vec<f32> = self
                .keywords
                .iter()
                .map(|k| lower.matches(k.as_str()).count() as f32)
                .collect();
            vector.push(0.01);
            vector
        }
    }

    #[async_trait]
    impl Embedder for KeywordEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(self.vector(text))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Ok(texts.iter().map(|t| self.vector(t)).collect())
        }

        fn model_name(&self) -> &str {
            "keyword-test"
        }
    }
}
