//! Laragen
//!
//! Compiles a resolved relational schema into Laravel migrations and
//! Eloquent relations.
//!
//! This is the main entry point for the command-line binary.

use clap::Parser;
use laragen_cli::Cli;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; RUST_LOG wins over --verbose
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = laragen_cli::VERSION, "Starting laragen");

    laragen_cli::run(cli).await
}
