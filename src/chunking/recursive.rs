//! Recursive character splitting.
//!
//! Text is split on the first separator that occurs in it, pieces that are
//! still too long are split again with the next separator, and the resulting
//! pieces are merged back into chunks of at most `chunk_size` characters that
//! overlap by up to `chunk_overlap` characters.

use super::ChunkingConfig;
use crate::error::{Result, SankoError};
use std::collections::VecDeque;

/// Separators tried in order: paragraphs, lines, words, characters.
const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Recursive character text splitter. Lengths are counted in characters, not bytes.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: ChunkingConfig,
    separators: Vec<String>,
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

impl TextSplitter {
    /// Create a splitter with the default separators.
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(SankoError::Config("chunk_size must be greater than zero".to_string()));
        }
        if config.chunk_overlap >= config.chunk_size {
            return Err(SankoError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                config.chunk_overlap, config.chunk_size
            )));
        }

        Ok(Self {
            config,
            separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
        })
    }

    /// Replace the separator list. An empty separator means "split into characters".
    pub fn with_separators(mut self, separators: Vec<String>) -> Self {
        self.separators = separators;
        self
    }

    /// Split text into chunks.
    pub fn split_text(&self, text: &str) -> Vec<String> {
        self.split_recursive(text, &self.separators)
    }

    fn split_recursive(&self, text: &str, separators: &[String]) -> Vec<String> {
        let (separator, remaining) =
            match separators.iter().position(|s| s.is_empty() || text.contains(s.as_str())) {
                Some(i) => (separators[i].as_str(), &separators[i + 1..]),
                None => ("", &separators[separators.len()..]),
            };

        let pieces: Vec<&str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split(separator).filter(|s| !s.is_empty()).collect()
        };

        let mut chunks = Vec::new();
        let mut pending: Vec<&str> = Vec::new();

        for piece in pieces {
            if char_len(piece) < self.config.chunk_size {
                pending.push(piece);
                continue;
            }

            if !pending.is_empty() {
                chunks.extend(self.merge(&pending, separator));
                pending.clear();
            }

            if remaining.is_empty() {
                chunks.push(piece.to_string());
            } else {
                chunks.extend(self.split_recursive(piece, remaining));
            }
        }

        if !pending.is_empty() {
            chunks.extend(self.merge(&pending, separator));
        }

        chunks
    }

    /// Greedily join pieces into chunks, keeping a trailing window as overlap.
    fn merge(&self, pieces: &[&str], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks = Vec::new();
        let mut window: VecDeque<(&str, usize)> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);
            let joiner = if window.is_empty() { 0 } else { sep_len };

            if total + len + joiner > self.config.chunk_size && !window.is_empty() {
                if let Some(chunk) = Self::join(&window, separator) {
                    chunks.push(chunk);
                }

                while total > self.config.chunk_overlap
                    || (total > 0
                        && total + len + if window.is_empty() { 0 } else { sep_len }
                            > self.config.chunk_size)
                {
                    let Some((_, first_len)) = window.pop_front() else {
                        break;
                    };
                    total -= first_len + if window.is_empty() { 0 } else { sep_len };
                }
            }

            total += len + if window.is_empty() { 0 } else { sep_len };
            window.push_back((piece, len));
        }

        if let Some(chunk) = Self::join(&window, separator) {
            chunks.push(chunk);
        }

        chunks
    }

    fn join(window: &VecDeque<(&str, usize)>, separator: &str) -> Option<String> {
        let joined = window
            .iter()
            .map(|(piece, _)| *piece)
            .collect::<Vec<_>>()
            .join(separator);
        let trimmed = joined.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> TextSplitter {
        TextSplitter::new(ChunkingConfig {
            chunk_size,
            chunk_overlap,
        })
        .unwrap()
    }

    #[test]
    fn test_short_text_is_one_chunk() {
        let text = "First paragraph.\n\nSecond paragraph.";
        let chunks = TextSplitter::new(ChunkingConfig::default())
            .unwrap()
            .split_text(text);
        assert_eq!(chunks, vec![text.to_string()]);
    }

    #[test]
    fn test_empty_text_has_no_chunks() {
        assert!(splitter(100, 10).split_text("").is_empty());
        assert!(splitter(100, 10).split_text("  \n\n  ").is_empty());
    }

    #[test]
    fn test_unbroken_text_splits_by_characters_with_overlap() {
        let text: String = "0123456789".repeat(250);
        let chunks = splitter(1000, 200).split_text(&text);

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0], text[..1000]);
        assert_eq!(chunks[1], text[800..1800]);
        assert_eq!(chunks[2], text[1600..]);
        assert_eq!(&chunks[0][800..], &chunks[1][..200]);
    }

    #[test]
    fn test_lengths_are_counted_in_characters() {
        let text = "あ".repeat(1500);
        let chunks = splitter(1000, 200).split_text(&text);

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 1000);
        assert_eq!(chunks[1].chars().count(), 700);
    }

    #[test]
    fn test_words_respect_chunk_size() {
        let text = (0..200)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ");
        let chunks = splitter(50, 10).split_text(&text);

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.chars().count() <= 50, "chunk too long: {:?}", chunk);
            assert!(!chunk.starts_with(' ') && !chunk.ends_with(' '));
        }
        // Every word survives somewhere
        assert!(chunks.iter().any(|c| c.contains("word0")));
        assert!(chunks.iter().any(|c| c.contains("word199")));
    }

    #[test]
    fn test_long_paragraph_falls_back_to_lines() {
        let long_paragraph = vec!["line of text"; 20].join("\n");
        let text = format!("short intro\n\n{}", long_paragraph);
        let chunks = splitter(60, 0).split_text(&text);

        assert_eq!(chunks[0], "short intro");
        assert!(chunks[1..].iter().all(|c| c.starts_with("line of text")));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        assert!(TextSplitter::new(ChunkingConfig {
            chunk_size: 0,
            chunk_overlap: 0
        })
        .is_err());
        assert!(TextSplitter::new(ChunkingConfig {
            chunk_size: 100,
            chunk_overlap: 100
        })
        .is_err());
    }
}
