// Conductor task-assignment service
// Main entry point for the conductor binary

use clap::Parser;
use conductor_engine::cli::{Cli, Command};
use conductor_engine::config::Config;
use conductor_engine::handlers::{handle_check, handle_serve, handle_state, OutputFormat};
use conductor_engine::telemetry::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    // Load configuration (or use custom path if provided)
    let config = if let Some(config_path) = &cli.config {
        Config::load_from_path(config_path)?
    } else {
        Config::load_or_create()?
    };

    // RUST_LOG still wins over both
    let log_level = cli.log.as_deref().unwrap_or(&config.core.log_level);
    init_logging(log_level);

    tracing::info!(
        "Conductor v{} ({} - {})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_COMMIT_HASH"),
        env!("BUILD_TIMESTAMP")
    );

    match cli.command {
        Command::Serve {
            host,
            port,
            load_test_data,
        } => handle_serve(&config, host, port, load_test_data).await,

        Command::Check { ping } => handle_check(&config, ping, format).await,

        Command::State { load_test_data } => handle_state(&config, load_test_data, format).await,
    }
}
