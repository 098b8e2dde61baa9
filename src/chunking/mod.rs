//! Chunking of loaded documents into retrievable passages.

mod recursive;

pub use recursive::TextSplitter;

use crate::loader::SourceDocument;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A passage cut from a source document, ready to be embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentChunk {
    /// Text content of this chunk.
    pub content: String,
    /// Metadata inherited from the source document.
    pub metadata: HashMap<String, String>,
    /// Order of this chunk within its source.
    pub order: i32,
}

/// Configuration for chunking.
#[derive(Debug, Clone)]
pub struct ChunkingConfig {
    /// Maximum chunk length in characters.
    pub chunk_size: usize,
    /// Characters carried over from the end of one chunk into the next.
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Split every document, numbering chunks per source.
pub fn split_documents(splitter: &TextSplitter, documents: &[SourceDocument]) -> Vec<ContentChunk> {
    documents
        .iter()
        .flat_map(|doc| {
            splitter
                .split_text(&doc.content)
                .into_iter()
                .enumerate()
                .map(|(order, content)| ContentChunk {
                    content,
                    metadata: doc.metadata.clone(),
                    order: order as i32,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::SOURCE_KEY;

    #[test]
    fn test_split_documents_numbers_per_source() {
        let splitter = TextSplitter::new(ChunkingConfig {
            chunk_size: 10,
            chunk_overlap: 0,
        })
        .unwrap();

        let docs = vec![
            SourceDocument::new("aaaa bbbb cccc".to_string(), "one.txt"),
            SourceDocument::new("dddd".to_string(), "two.txt"),
        ];

        let chunks = split_documents(&splitter, &docs);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].order, 0);
        assert_eq!(chunks[1].order, 1);
        assert_eq!(chunks[1].metadata[SOURCE_KEY], "one.txt");
        assert_eq!(chunks[2].order, 0);
        assert_eq!(chunks[2].metadata[SOURCE_KEY], "two.txt");
    }
}
