//! Retrieval-augmented question answering.
//!
//! A [`QueryPipeline`] runs in one of two modes fixed at construction:
//! RAG mode retrieves chunks from a [`VectorIndex`] and grounds the answer in
//! them, plain mode sends the question straight to the chat model.

mod index;
mod pipeline;
mod prompt;
mod retriever;

pub use index::{load_index, EmbeddedIndex, VectorIndex};
pub use pipeline::{PipelineConfig, QueryPipeline};
pub use prompt::PromptAssembler;
pub use retriever::Retriever;

use crate::vector_store::SOURCE_KEY;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// A retrieved passage with its metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    pub metadata: HashMap<String, String>,
}

impl DocumentChunk {
    pub fn new(content: impl Into<String>, metadata: HashMap<String, String>) -> Self {
        Self {
            content: content.into(),
            metadata,
        }
    }

    /// The originating file path, if known.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// Whether a pipeline grounds answers in retrieved chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatingMode {
    Rag,
    Plain,
}

impl fmt::Display for OperatingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperatingMode::Rag => write!(f, "rag"),
            OperatingMode::Plain => write!(f, "plain"),
        }
    }
}

/// The answer to one query.
///
/// `source_documents` is empty in plain mode and when retrieval found nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub answer: String,
    pub source_documents: Vec<DocumentChunk>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_source() {
        let mut metadata = HashMap::new();
        metadata.insert("source".to_string(), "documents/tokyo.txt".to_string());
        let chunk = DocumentChunk::new("Tokyo is the capital.", metadata);
        assert_eq!(chunk.source(), Some("documents/tokyo.txt"));

        let bare = DocumentChunk::new("x", HashMap::new());
        assert_eq!(bare.source(), None);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(OperatingMode::Rag.to_string(), "rag");
        assert_eq!(OperatingMode::Plain.to_string(), "plain");
    }
}
