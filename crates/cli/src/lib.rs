//! # Laragen CLI
//!
//! Command-line interface for Laragen.
//!
//! All file I/O happens here, up front and asynchronously; the compiler
//! itself runs synchronously over the loaded document.
//!
//! ## Commands
//!
//! - `migrations` - Print the resolved migrations in dependency order
//! - `models` - Print the resolved model classes and their relations
//! - `check` - Compile a schema and report a summary and any warnings
//!

pub mod render;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use laragen_codegen::{Generator, GeneratorConfig};
use laragen_ir::{SchemaDocument, load_schema_from_string};
use std::path::{Path, PathBuf};

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Configuration file picked up from the working directory
pub const DEFAULT_CONFIG: &str = "laragen.toml";

// ============================================================================
// Arguments
// ============================================================================

/// Output format options for CLI commands
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Text,
    /// JSON output for scripting
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "laragen", version)]
#[command(about = "Compile a resolved relational schema into Laravel migrations and Eloquent relations")]
#[command(subcommand_required = true, arg_required_else_help = true)]
pub struct Cli {
    /// Generator configuration (defaults to ./laragen.toml when present)
    #[arg(short, long, global = true, env = "LARAGEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the resolved migrations in dependency order
    Migrations {
        /// Schema document (JSON)
        schema: PathBuf,

        /// Only print this table
        #[arg(long)]
        table: Option<String>,
    },

    /// Print the resolved models and their relations
    Models {
        /// Schema document (JSON)
        schema: PathBuf,

        /// Only print this model
        #[arg(long)]
        model: Option<String>,
    },

    /// Compile a schema and report a summary
    Check {
        /// Schema document (JSON)
        schema: PathBuf,
    },
}

impl Command {
    /// The schema document the command reads
    pub fn schema(&self) -> &Path {
        match self {
            Command::Migrations { schema, .. }
            | Command::Models { schema, .. }
            | Command::Check { schema } => schema,
        }
    }
}

// ============================================================================
// Entry points
// ============================================================================

/// Run a parsed command and print its output
pub async fn run(cli: Cli) -> Result<()> {
    if cli.no_color {
        colored::control::set_override(false);
    }
    let out = execute(&cli).await?;
    print!("{out}");
    Ok(())
}

/// Run a parsed command and return what it would print
pub async fn execute(cli: &Cli) -> Result<String> {
    let config = load_config(cli.config.as_deref()).await?;
    let schema = cli.command.schema();
    let doc = load_document(schema).await?;

    let output = Generator::new(config)
        .generate(&doc)
        .with_context(|| format!("failed to compile {}", schema.display()))?;

    match &cli.command {
        Command::Migrations { table, .. } => render::migrations(&output, table.as_deref(), cli.format),
        Command::Models { model, .. } => render::models(&output, model.as_deref(), cli.format),
        Command::Check { .. } => render::check(&output, cli.format),
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load the generator configuration.
///
/// An explicit path must exist. Without one, `laragen.toml` in the working
/// directory is used when present, else the defaults.
pub async fn load_config(path: Option<&Path>) -> Result<GeneratorConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_CONFIG);
            if !tokio::fs::try_exists(&fallback).await.unwrap_or(false) {
                tracing::debug!("No configuration file, using defaults");
                return Ok(GeneratorConfig::default());
            }
            fallback
        }
    };

    let content = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let config = GeneratorConfig::from_toml_str(&content)
        .with_context(|| format!("invalid config {}", path.display()))?;
    tracing::debug!(path = %path.display(), "Loaded configuration");
    Ok(config)
}

/// Load a schema document
pub async fn load_document(path: &Path) -> Result<SchemaDocument> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read schema {}", path.display()))?;
    let doc = load_schema_from_string(&content)
        .with_context(|| format!("invalid schema {}", path.display()))?;
    Ok(doc)
}

// ============================================================================
// Tests
// ============================================================================
