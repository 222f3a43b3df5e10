// Smart Librarian
// Main entry point for the librarian binary

use clap::Parser;
use librarian_engine::cli::{Cli, Command};
use librarian_engine::config::Config;
use librarian_engine::handlers::{
    handle_ask, handle_chat, handle_doctor, handle_ingest, handle_setup, OutputFormat,
};
use librarian_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables take precedence
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration (custom path if provided, else ./librarian.toml or defaults)
    let config = Config::load(cli.config.as_deref())?;

    // --log wins over config; RUST_LOG wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_telemetry_with_level(log_level);

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    tracing::info!("Smart Librarian v{} ({} - {})", version, commit, timestamp);

    // Determine output format
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Handle commands
    match cli.command {
        Command::Chat => handle_chat(&config, format).await,

        Command::Ask { text } => {
            tracing::debug!("Answering one question");
            handle_ask(text, &config, format).await
        }

        Command::Ingest { reset } => {
            tracing::info!("Ingesting book summaries (reset: {})", reset);
            handle_ingest(reset, &config, format).await
        }

        Command::Setup => handle_setup().await,

        Command::Doctor => {
            tracing::info!("Running diagnostics...");
            handle_doctor(&config, format).await
        }
    }
}
