//! CLI output formatting utilities.

use crate::rag::QueryResult;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Characters of chunk content shown in the sources list.
const PREVIEW_CHARS: usize = 200;

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print a list item.
    pub fn list_item(msg: &str) {
        println!("  {} {}", style("*").cyan(), msg);
    }

    /// Print an answer followed by the chunks it was grounded in.
    pub fn query_result(result: &QueryResult) {
        println!("\n{}\n", result.answer.trim());

        if result.source_documents.is_empty() {
            return;
        }

        Output::header("Sources");
        for (i, chunk) in result.source_documents.iter().enumerate() {
            println!("\n{}", style(format!("Document {}", i + 1)).bold());
            println!("   {}", content_preview(&chunk.content, PREVIEW_CHARS));
            if let Some(source) = chunk.source() {
                println!("   {}", style(source).dim());
            }
        }
        println!();
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}

/// Flatten newlines and cut to `max_chars` characters, adding an ellipsis when cut.
fn content_preview(content: &str, max_chars: usize) -> String {
    let content = content.replace('\n', " ");
    match content.char_indices().nth(max_chars) {
        None => content,
        Some((cut, _)) => format!("{}...", &content[..cut]),
    }
}
