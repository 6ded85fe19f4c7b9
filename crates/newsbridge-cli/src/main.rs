use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsbridge_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "newsbridge")]
#[command(author, version, about = "AI news ingestion, scoring, and translation pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline once and exit
    Run,
    /// Run continuously, following the stored schedule settings
    Daemon,
    /// Show article counts and schedule state
    Status,
    /// Delete articles past the retention window
    Cleanup,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load()?;

    // RUST_LOG wins over the configured level.
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    let db = Database::new(&config).await?;

    match cli.command {
        Some(Commands::Run) | None => commands::run::run(db, config).await,
        Some(Commands::Daemon) => commands::daemon::run(db, config).await,
        Some(Commands::Status) => commands::status::run(&db).await,
        Some(Commands::Cleanup) => commands::cleanup::run(db, config).await,
    }
}
