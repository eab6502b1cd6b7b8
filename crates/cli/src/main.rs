//! formgrade CLI - Main Entry Point
//!
//! Exit status: 0 when every check passes, 1 when any check fails, 2 when
//! the rubric, document or configuration cannot be loaded.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use formgrade_cli::commands::{grade, journey, rubric};
use formgrade_cli::output::{self, print_error};
use formgrade_engine::GraderConfig;

/// formgrade - Declarative HTML form grading
#[derive(Parser)]
#[command(name = "formgrade")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = "formgrade.toml", env = "FORMGRADE_CONFIG", global = true)]
    config: PathBuf,

    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a document against a rubric
    Grade(grade::GradeArgs),

    /// Run a scripted user journey over a document
    Journey(journey::JourneyArgs),

    /// Validate a rubric and list its fields
    Rubric(rubric::RubricArgs),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            print_error(&format!("{:#}", e));
            std::process::exit(2);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let config = GraderConfig::load(&cli.config)?;
    debug!("Using configuration from {}", cli.config.display());

    match cli.command {
        Commands::Grade(args) => grade::execute(args, config, cli.format).await,
        Commands::Journey(args) => journey::execute(args, config, cli.format).await,
        Commands::Rubric(args) => rubric::execute(args, cli.format).await,
        Commands::Version => {
            println!("formgrade v{}", formgrade_common::VERSION);
            println!("Declarative HTML form grading against JSON rubrics");
            Ok(true)
        }
    }
}
