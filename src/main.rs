//! Sanko CLI entry point.

use anyhow::Result;
use clap::Parser;
use sanko::cli::{commands, Cli, Commands, QueryArgs};
use sanko::config::Settings;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config_path = match &cli.config {
        Some(path) => Settings::expand_path(path),
        None => Settings::default_config_path(),
    };
    let settings = Settings::load_from(Some(&config_path))?;

    // Initialize logging
    let log_level = match cli.verbose {
        0 => settings.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("sanko={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Execute command
    match cli.command {
        None => {
            commands::run_chat(&QueryArgs::default(), settings).await?;
        }

        Some(Commands::Chat { query }) => {
            commands::run_chat(&query, settings).await?;
        }

        Some(Commands::Ask { question, query }) => {
            commands::run_ask(&question.join(" "), &query, settings).await?;
        }

        Some(Commands::Ingest { documents, index }) => {
            commands::run_ingest(documents, index, settings).await?;
        }

        Some(Commands::Status { index }) => {
            commands::run_status(index, settings).await?;
        }

        Some(Commands::Config { action }) => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
