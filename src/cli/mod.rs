//! CLI module for Sanko.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Args, Parser, Subcommand};

/// Sanko - Ask questions about your own documents
///
/// A local-first CLI that answers questions with a local LLM, grounded in the
/// documents you ingest. The name comes from the Japanese word for "reference."
#[derive(Parser, Debug)]
#[command(name = "sanko")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true, env = "SANKO_CONFIG")]
    pub config: Option<String>,

    /// Defaults to `chat` when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by commands that answer questions.
#[derive(Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Index directory (defaults to vector_store.index_dir)
    #[arg(short, long)]
    pub index: Option<String>,

    /// Chat model to use (defaults to llm.model)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Number of chunks to retrieve per question (defaults to rag.top_k)
    #[arg(short = 'k', long)]
    pub top_k: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive question-answer session
    Chat {
        #[command(flatten)]
        query: QueryArgs,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question to ask
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,

        #[command(flatten)]
        query: QueryArgs,
    },

    /// Build the index from a documents directory
    Ingest {
        /// Documents directory (defaults to ingest.documents_dir)
        #[arg(short, long)]
        documents: Option<String>,

        /// Index directory (defaults to vector_store.index_dir)
        #[arg(short, long)]
        index: Option<String>,
    },

    /// Show what is in the index
    Status {
        /// Index directory (defaults to vector_store.index_dir)
        #[arg(short, long)]
        index: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}
