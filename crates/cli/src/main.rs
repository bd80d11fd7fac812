//! socialcare CLI, the main entry point.
//!
//! Commands:
//! - `onboard`: initialize config and the data directory
//! - `chat`:    interactive counseling session or single question
//! - `sync`:    replace the knowledge base from a records file
//! - `status`:  show assistant status

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(
    name = "socialcare",
    about = "Counseling assistant for child protection caseworkers",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize configuration and the data directory
    Onboard,

    /// Chat with the counseling assistant
    Chat {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        question: Option<String>,
    },

    /// Replace the knowledge base from a JSON records file
    Sync {
        /// Path to a JSON array of {id, content} records
        file: Option<PathBuf>,

        /// Load a small built-in sample batch instead of a file
        #[arg(long, conflicts_with = "file")]
        sample: bool,
    },

    /// Show assistant status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat { question } => commands::chat::run(question).await?,
        Commands::Sync { file, sample } => commands::sync::run(file, sample).await?,
        Commands::Status => commands::status::run().await?,
    }

    Ok(())
}
