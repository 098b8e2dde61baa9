//! Error types for Sanko.

use thiserror::Error;

/// Library-level error type for Sanko operations.
#[derive(Error, Debug)]
pub enum SankoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Document ingestion failed: {0}")]
    Ingest(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Chat model error: {0}")]
    ChatModel(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("OpenAI-compatible API error: {0}")]
    OpenAI(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Sanko operations.
pub type Result<T> = std::result::Result<T, SankoError>;

/// Errors returned by the query pipeline.
///
/// Every failure of a single `answer` call maps to exactly one of these; the
/// pipeline never hands back a partial result alongside an error.
#[derive(Error, Debug)]
pub enum QueryError {
    /// The query was empty or whitespace-only. No collaborator was called.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The index lookup failed.
    #[error("Retrieval failed: {0}")]
    RetrievalFailed(#[source] SankoError),

    /// The chat completion call failed.
    #[error("Chat model failed: {0}")]
    ChatModelFailed(#[source] SankoError),

    /// The caller aborted the query or a call boundary timed out.
    #[error("Query cancelled: {0}")]
    Cancelled(String),

    /// A collaborator misbehaved in a way not covered above.
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl QueryError {
    /// Whether this error came from cancellation or a timeout.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, QueryError::Cancelled(_))
    }
}
