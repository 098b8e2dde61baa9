//! Sanko - Ask questions about your own documents
//!
//! A local-first CLI and library for retrieval-augmented question answering
//! against a local, OpenAI-compatible LLM server.
//!
//! # Overview
//!
//! Sanko allows you to:
//! - Build a vector index from a directory of text and Markdown files
//! - Ask questions answered from the most relevant passages, with sources
//! - Fall back to plain chat with the model when no index exists
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration management and prompt templates
//! - `loader` - Reading documents from disk
//! - `chunking` - Recursive character text splitting
//! - `embedding` - Embedding generation
//! - `vector_store` - Vector database abstraction
//! - `llm` - Chat model abstraction
//! - `rag` - Retrieval, prompt assembly, and the query pipeline
//! - `orchestrator` - Ingestion and pipeline wiring
//!
//! # Example
//!
//! ```rust,no_run
//! use sanko::config::Settings;
//! use sanko::llm::OpenAIChatModel;
//! use sanko::orchestrator::Orchestrator;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let chat_model = Arc::new(OpenAIChatModel::from_settings(&settings.llm)?);
//!     let orchestrator = Orchestrator::new(settings.clone())?;
//!
//!     let pipeline = orchestrator.query_pipeline(chat_model, &settings.index_dir(), settings.rag.top_k)?;
//!     let result = pipeline.answer("What is the capital of Japan?").await?;
//!     println!("{}", result.answer);
//!
//!     Ok(())
//! }
//! ```

pub mod chunking;
pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod llm;
pub mod loader;
pub mod openai;
pub mod orchestrator;
pub mod rag;
pub mod vector_store;

pub use error::{QueryError, Result, SankoError};
