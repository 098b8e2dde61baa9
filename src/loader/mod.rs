//! Loading source documents from disk.

mod directory;

pub use directory::DirectoryLoader;

use crate::vector_store::SOURCE_KEY;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A whole text file read from the documents directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    pub content: String,
    pub metadata: HashMap<String, String>,
}

impl SourceDocument {
    /// Create a document whose `source` metadata points at `source`.
    pub fn new(content: String, source: &str) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert(SOURCE_KEY.to_string(), source.to_string());
        Self { content, metadata }
    }

    /// The originating file path, if recorded.
    pub fn source(&self) -> Option<&str> {
        self.metadata.get(SOURCE_KEY).map(String::as_str)
    }
}

/// Whether an entry name is hidden (dot-prefixed).
pub(crate) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Check that `dir` exists, is a directory, and holds at least one visible entry.
pub fn directory_has_content(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }

    match std::fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .any(|e| !is_hidden(&e.file_name().to_string_lossy())),
        Err(_) => false,
    }
}
