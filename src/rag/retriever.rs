//! Top-k retrieval over a vector index.

use super::{DocumentChunk, VectorIndex};
use crate::error::QueryError;
use std::sync::Arc;
use tracing::debug;

/// Default number of chunks fetched per query.
pub const DEFAULT_K: usize = 3;

/// Fetches the `k` most relevant chunks for a query.
///
/// Ranking belongs to the index; results are passed through in the order the
/// index returned them.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn VectorIndex>,
    k: usize,
}

impl Retriever {
    /// Create a retriever. `k` is clamped to at least 1.
    pub fn new(index: Arc<dyn VectorIndex>, k: usize) -> Self {
        Self { index, k: k.max(1) }
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Retrieve with the configured `k`.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<DocumentChunk>, QueryError> {
        self.retrieve_k(query, self.k).await
    }

    /// Retrieve with an explicit `k`.
    pub async fn retrieve_k(&self, query: &str, k: usize) -> Result<Vec<DocumentChunk>, QueryError> {
        let k = k.max(1);
        let mut chunks = self
            .index
            .query(query, k)
            .await
            .map_err(QueryError::RetrievalFailed)?;

        chunks.truncate(k);
        debug!("Retrieved {} chunks (k = {})", chunks.len(), k);
        Ok(chunks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Result, SankoError};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Returns a fixed list, ignoring `k`, and records the `k` it was asked for.
    struct FixedIndex {
        chunks: Vec<DocumentChunk>,
        requested_k: Mutex<Vec<usize>>,
    }

    impl FixedIndex {
        fn new(contents: &[&str]) -> Self {
            Self {
                chunks: contents
                    .iter()
                    .map(|c| DocumentChunk::new(*c, HashMap::new()))
                    .collect(),
                requested_k: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl VectorIndex for FixedIndex {
        async fn query(&self, _text: &str, k: usize) -> Result<Vec<DocumentChunk>> {
            self.requested_k.lock().unwrap().push(k);
            Ok(self.chunks.clone())
        }
    }

    struct FailingIndex;

    #[async_trait]
    impl VectorIndex for FailingIndex {
        async fn query(&self, _text: &str, _k: usize) -> Result<Vec<DocumentChunk>> {
            Err(SankoError::VectorStore("disk on fire".to_string()))
        }
    }

    #[tokio::test]
    async fn test_keeps_provider_order_and_truncates() {
        let index = Arc::new(FixedIndex::new(&["c", "a", "b", "d"]));
        let retriever = Retriever::new(index.clone(), 3);

        let chunks = retriever.retrieve("q").await.unwrap();
        let contents: Vec<&str> = chunks.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["c", "a", "b"]);
        assert_eq!(*index.requested_k.lock().unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn test_fewer_results_than_k() {
        let retriever = Retriever::new(Arc::new(FixedIndex::new(&["only"])), 3);
        assert_eq!(retriever.retrieve("q").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_index_is_not_an_error() {
        let retriever = Retriever::new(Arc::new(FixedIndex::new(&[])), DEFAULT_K);
        let chunks = retriever.retrieve("q").await.unwrap();
        assert!(chunks.is_empty());
    }

    #[tokio::test]
    async fn test_k_is_clamped() {
        let index = Arc::new(FixedIndex::new(&["a", "b"]));
        let retriever = Retriever::new(index.clone(), 0);
        assert_eq!(retriever.k(), 1);

        let chunks = retriever.retrieve_k("q", 0).await.unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(*index.requested_k.lock().unwrap(), vec![1]);
    }

    #[tokio::test]
    async fn test_provider_failure_is_retrieval_failed() {
        let retriever = Retriever::new(Arc::new(FailingIndex), 3);
        let err = retriever.retrieve("q").await.unwrap_err();
        assert!(matches!(err, QueryError::RetrievalFailed(SankoError::VectorStore(_))));
    }
}
