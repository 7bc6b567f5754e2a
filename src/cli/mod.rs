//! Scanlens CLI - ingest scan reports and query the stored results
//!
//! ## Commands
//! - `ingest`: stream a report file into the configured store
//! - `issues`: list issues with layered filters and pagination
//! - `stats`: per-operation, per-path and report totals

pub mod commands;
mod context;
mod output;

pub use context::CliContext;
pub use output::{OutputFormat, OutputWriter};

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Scanlens - streaming ingestion and queries for API conformance scan reports
#[derive(Parser, Debug)]
#[command(
    name = "scanlens",
    version,
    about = "Ingest and query API conformance scan reports",
    long_about = "Scanlens streams API conformance scan reports into an embedded store \
                  without loading them into memory, then answers filtered, paginated \
                  issue queries and aggregate statistics against that store."
)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    pub format: OutputFormat,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors and results
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Report database URL, overriding the configured store
    #[arg(long, global = true, env = "SCANLENS_DATABASE_URL")]
    pub database: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Stream a scan report into the store, replacing the previous one
    #[command(visible_alias = "i")]
    Ingest(commands::ingest::IngestArgs),

    /// List stored issues
    Issues(commands::issues::IssuesArgs),

    /// Show aggregate statistics for the stored report
    Stats(commands::stats::StatsArgs),
}

/// CLI application runner
pub struct CliApp {
    cli: Cli,
    context: CliContext,
}

impl CliApp {
    /// Create a new CLI application instance
    pub async fn new() -> anyhow::Result<Self> {
        let cli = Cli::parse();
        let context = CliContext::new(&cli).await?;
        Ok(Self { cli, context })
    }

    /// Run the CLI application
    pub async fn run(self) -> anyhow::Result<i32> {
        match self.cli.command {
            Commands::Ingest(ref args) => commands::ingest::run(&self.context, args).await,
            Commands::Issues(ref args) => commands::issues::run(&self.context, args).await,
            Commands::Stats(ref args) => commands::stats::run(&self.context, args).await,
        }
    }
}

/// Process exit codes
pub mod exit_codes {
    /// Success
    pub const SUCCESS: i32 = 0;
    /// `issues --fail-on-issues` matched at least one issue
    pub const ISSUES_FOUND: i32 = 1;
    /// Configuration or argument error
    pub const CONFIG_ERROR: i32 = 2;
    /// The report could not be ingested
    pub const INGEST_ERROR: i32 = 3;
    /// Internal error
    pub const INTERNAL_ERROR: i32 = 99;
}
