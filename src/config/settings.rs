//! Configuration settings for Sanko.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub llm: LlmSettings,
    pub embedding: EmbeddingSettings,
    pub ingest: IngestSettings,
    pub vector_store: VectorStoreSettings,
    pub rag: RagSettings,
    pub prompts: PromptSettings,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            log_level: "warn".to_string(),
        }
    }
}

/// Chat model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Base URL of an OpenAI-compatible server.
    pub api_base: String,
    /// API key, if the server wants one.
    pub api_key: Option<String>,
    /// Model name passed to the server.
    pub model: String,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Sampling temperature. Server default when unset.
    pub temperature: Option<f32>,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/v1".to_string(),
            api_key: None,
            model: "Llama-3-ELYZA-JP-8B-Q4_K_M".to_string(),
            max_tokens: 1024,
            temperature: None,
            request_timeout_secs: 300,
        }
    }
}

/// Embedding generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// Base URL of an OpenAI-compatible embeddings endpoint.
    pub api_base: String,
    /// API key, if the server wants one.
    pub api_key: Option<String>,
    /// Embedding model to use.
    pub model: String,
    /// Requested embedding dimensions. Only sent when set.
    pub dimensions: Option<u32>,
    /// Number of texts per embeddings request.
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8080/v1".to_string(),
            api_key: None,
            model: "intfloat/multilingual-e5-small".to_string(),
            dimensions: None,
            batch_size: 100,
        }
    }
}

/// Document ingestion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Directory holding the source documents.
    pub documents_dir: String,
    /// Maximum chunk size in characters.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// File extensions to load. Empty means every file.
    pub extensions: Vec<String>,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            documents_dir: "documents".to_string(),
            chunk_size: 1000,
            chunk_overlap: 200,
            extensions: vec!["txt".to_string(), "md".to_string()],
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorStoreSettings {
    /// Directory holding the persisted index.
    pub index_dir: String,
}

impl Default for VectorStoreSettings {
    fn default() -> Self {
        Self {
            index_dir: "vectorstore".to_string(),
        }
    }
}

/// Question answering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    /// Number of chunks retrieved per query.
    pub top_k: usize,
    /// Language the model answers in unless told otherwise.
    pub response_language: String,
    /// Upper bound on a single index lookup, in seconds.
    pub retrieval_timeout_secs: u64,
    /// Upper bound on a single chat completion, in seconds.
    pub completion_timeout_secs: u64,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            top_k: 3,
            response_language: "Japanese".to_string(),
            retrieval_timeout_secs: 60,
            completion_timeout_secs: 300,
        }
    }
}

impl RagSettings {
    pub fn retrieval_timeout(&self) -> Duration {
        Duration::from_secs(self.retrieval_timeout_secs)
    }

    pub fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.completion_timeout_secs)
    }
}

/// Prompt customization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct PromptSettings {
    /// Directory for custom prompts (overrides defaults).
    pub custom_dir: Option<String>,
    /// Custom variables available in all prompts as {{variable_name}}.
    pub variables: HashMap<String, String>,
}

impl Settings {
    /// Load settings from the default configuration file.
    pub fn load() -> crate::error::Result<Self> {
        Self::load_from(None)
    }

    /// Load settings from a specific path, or default location if None.
    pub fn load_from(path: Option<&PathBuf>) -> crate::error::Result<Self> {
        let config_path = match path {
            Some(p) => p.clone(),
            None => Self::default_config_path(),
        };

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let settings: Settings = toml::from_str(&content)?;
            Ok(settings)
        } else {
            Ok(Settings::default())
        }
    }

    /// Save settings to a specific path.
    pub fn save_to(&self, path: &PathBuf) -> crate::error::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::error::SankoError::Config(e.to_string()))?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sanko")
            .join("config.toml")
    }

    /// Expand shell variables in paths (e.g., ~).
    pub fn expand_path(path: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(path).to_string())
    }

    /// Get the expanded documents directory path.
    pub fn documents_dir(&self) -> PathBuf {
        Self::expand_path(&self.ingest.documents_dir)
    }

    /// Get the expanded index directory path.
    pub fn index_dir(&self) -> PathBuf {
        Self::expand_path(&self.vector_store.index_dir)
    }

    /// Variables available to every prompt template.
    ///
    /// `language` defaults to `rag.response_language` unless the user defined it.
    pub fn prompt_variables(&self) -> HashMap<String, String> {
        let mut vars = self.prompts.variables.clone();
        vars.entry("language".to_string())
            .or_insert_with(|| self.rag.response_language.clone());
        vars
    }
}
