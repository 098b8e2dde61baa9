//! Configuration module for Sanko.
//!
//! Handles loading and managing application settings and prompt templates.

mod prompts;
mod settings;

pub use prompts::{Prompts, RagPrompts};
pub use settings::{
    EmbeddingSettings, GeneralSettings, IngestSettings, LlmSettings, PromptSettings,
    RagSettings, Settings, VectorStoreSettings,
};
