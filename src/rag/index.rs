//! Nearest-neighbor index backed by an embedder and a vector store.

use super::DocumentChunk;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::vector_store::{SqliteVectorStore, VectorStore, EMBEDDING_MODEL_KEY, SOURCE_KEY};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// A searchable index of document chunks.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Return up to `k` chunks most similar to `text`, best first.
    async fn query(&self, text: &str, k: usize) -> Result<Vec<DocumentChunk>>;
}

/// Index that embeds the query text and searches a vector store.
pub struct EmbeddedIndex {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
}

impl EmbeddedIndex {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self { embedder, store }
    }

    /// The underlying vector store.
    pub fn store(&self) -> Arc<dyn VectorStore> {
        self.store.clone()
    }
}

#[async_trait]
impl VectorIndex for EmbeddedIndex {
    #[instrument(skip(self, text))]
    async fn query(&self, text: &str, k: usize) -> Result<Vec<DocumentChunk>> {
        let embedding = self.embedder.embed(text).await?;
        let results = self.store.search(&embedding, k).await?;

        debug!("Index returned {} results", results.len());

        Ok(results
            .into_iter()
            .map(|r| {
                let mut metadata = r.document.metadata;
                if !r.document.source.is_empty() {
                    metadata
                        .entry(SOURCE_KEY.to_string())
                        .or_insert(r.document.source);
                }
                DocumentChunk::new(r.document.content, metadata)
            })
            .collect())
    }
}

/// Load the index persisted in `location`.
///
/// Returns `Ok(None)` when no index has been written there. An empty index is
/// still an index. If the index was built with a different embedding model
/// than `embedding_model`, a warning is logged and the index is used anyway.
pub fn load_index(
    location: &Path,
    embedder: Arc<dyn Embedder>,
    embedding_model: &str,
) -> Result<Option<EmbeddedIndex>> {
    let Some(store) = SqliteVectorStore::open_existing(location)? else {
        info!("No index at {:?}", location);
        return Ok(None);
    };

    match store.get_meta(EMBEDDING_MODEL_KEY)? {
        Some(model) if model != embedding_model => warn!(
            "Index at {:?} was built with embedding model '{}', but '{}' is configured",
            location, model, embedding_model
        ),
        Some(_) => {}
        None => debug!("Index at {:?} does not record its embedding model", location),
    }

    info!("Loaded index from {:?}", location);
    Ok(Some(EmbeddedIndex::new(embedder, Arc::new(store))))
}
