//! Recursive directory loader for plain-text documents.

use super::{is_hidden, SourceDocument};
use crate::error::{Result, SankoError};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Loads every matching text file below a directory.
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    extensions: Vec<String>,
}

impl DirectoryLoader {
    /// Create a loader accepting the given extensions (without the dot).
    /// An empty list accepts every file.
    pub fn new(extensions: &[String]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| self.extensions.contains(&ext.to_lowercase()))
            .unwrap_or(false)
    }

    /// Load documents sorted by path.
    pub fn load(&self, dir: &Path) -> Result<Vec<SourceDocument>> {
        if !dir.is_dir() {
            return Err(SankoError::Ingest(format!(
                "documents directory not found: {}",
                dir.display()
            )));
        }

        let mut documents = Vec::new();

        let walker = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden_entry(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() || !self.accepts(entry.path()) {
                continue;
            }

            let path = entry.path();
            let bytes = std::fs::read(path)?;
            match String::from_utf8(bytes) {
                Ok(content) => {
                    debug!("Loaded {} ({} chars)", path.display(), content.chars().count());
                    documents.push(SourceDocument::new(content, &path.to_string_lossy()));
                }
                Err(_) => warn!("Skipping non-UTF-8 file: {}", path.display()),
            }
        }

        documents.sort_by(|a, b| a.source().cmp(&b.source()));
        Ok(documents)
    }
}

fn is_hidden_entry(entry: &DirEntry) -> bool {
    is_hidden(&entry.file_name().to_string_lossy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn default_loader() -> DirectoryLoader {
        DirectoryLoader::new(&["txt".to_string(), "md".to_string()])
    }

    #[test]
    fn test_loads_matching_files_recursively_in_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("b.txt"), "bravo").unwrap();
        fs::write(dir.path().join("a.md"), "alpha").unwrap();
        fs::write(dir.path().join("sub").join("c.TXT"), "charlie").unwrap();
        fs::write(dir.path().join("image.png"), [0u8, 1, 2]).unwrap();

        let docs = default_loader().load(dir.path()).unwrap();
        let contents: Vec<&str> = docs.iter().map(|d| d.content.as_str()).collect();
        assert_eq!(contents, vec!["alpha", "bravo", "charlie"]);
        assert!(docs[0].source().unwrap().ends_with("a.md"));
    }

    #[test]
    fn test_skips_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join(".git").join("notes.txt"), "hidden").unwrap();
        fs::write(dir.path().join(".draft.md"), "hidden").unwrap();
        fs::write(dir.path().join("visible.md"), "shown").unwrap();

        let docs = default_loader().load(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "shown");
    }

    #[test]
    fn test_skips_non_utf8_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.txt"), [0xff, 0xfe, 0xfd]).unwrap();
        fs::write(dir.path().join("good.txt"), "東京").unwrap();

        let docs = default_loader().load(dir.path()).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "東京");
    }

    #[test]
    fn test_empty_extension_list_accepts_everything() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.rst"), "rst").unwrap();
        fs::write(dir.path().join("README"), "plain").unwrap();

        let docs = DirectoryLoader::new(&[]).load(dir.path()).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = default_loader().load(&dir.path().join("absent"));
        assert!(matches!(result, Err(SankoError::Ingest(_))));
    }
}
