//! Interactive question-answer loop.

use super::ask::{answer_interruptibly, build_pipeline};
use crate::cli::{Output, QueryArgs};
use crate::config::Settings;
use crate::rag::OperatingMode;
use anyhow::Result;
use console::style;
use std::future::Future;
use std::io::{self, BufRead, Write};
use tokio::sync::mpsc;
use tracing::debug;

/// What the prompt produced.
#[derive(Debug, PartialEq)]
enum Input {
    Line(String),
    Eof,
    Interrupted,
}

/// Read stdin lines on a dedicated thread.
///
/// The thread is detached, so a pending read does not hold up runtime shutdown.
fn spawn_line_reader() -> mpsc::UnboundedReceiver<io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Wait for the next line, or for `interrupt` to fire first.
async fn next_input<F>(
    lines: &mut mpsc::UnboundedReceiver<io::Result<String>>,
    interrupt: F,
) -> io::Result<Input>
where
    F: Future<Output = ()>,
{
    tokio::select! {
        line = lines.recv() => match line {
            Some(line) => line.map(Input::Line),
            None => Ok(Input::Eof),
        },
        _ = interrupt => Ok(Input::Interrupted),
    }
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Run the interactive chat command.
///
/// Each line is answered independently. The loop ends on `exit`, at end of
/// input, or on Ctrl+C at the prompt. Errors are reported and the loop carries on.
pub async fn run_chat(args: &QueryArgs, settings: Settings) -> Result<()> {
    let pipeline = build_pipeline(args, settings)?;

    match pipeline.mode() {
        OperatingMode::Rag => Output::success("RAG mode ready"),
        OperatingMode::Plain => {
            Output::warning("No index found. Run 'sanko ingest' to answer from your documents.");
            Output::success("LLM-only mode ready");
        }
    }

    println!("\n{}", style("Sanko").bold().cyan());
    println!(
        "{}\n",
        style("Type your questions, or 'exit' to quit. Ctrl+C cancels the current answer.").dim()
    );

    let mut lines = spawn_line_reader();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", style("Question:").green().bold());
        stdout.flush()?;

        let input = match next_input(&mut lines, ctrl_c()).await? {
            Input::Line(line) => line,
            Input::Eof => {
                println!();
                break;
            }
            Input::Interrupted => {
                println!();
                Output::info("Goodbye!");
                break;
            }
        };

        let input = input.trim();

        if input.is_empty() {
            continue;
        }

        if input.eq_ignore_ascii_case("exit") {
            Output::info("Goodbye!");
            break;
        }

        let spinner = Output::spinner("Thinking...");
        let outcome = answer_interruptibly(&pipeline, input).await;
        spinner.finish_and_clear();

        match outcome {
            Ok(result) => Output::query_result(&result),
            Err(e) if e.is_cancelled() => {
                debug!("Query cancelled: {}", e);
                Output::warning(&format!("{}", e));
            }
            Err(e) => Output::error(&format!("Error: {}", e)),
        }
    }

    Ok(())
}
