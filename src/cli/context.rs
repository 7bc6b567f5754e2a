//! CLI Context - configuration, logging and store for one invocation

use std::path::Path;

use anyhow::{Context, Result};
use scanlens_core::Config;

use crate::app::{AppHandle, create_app};
use crate::cli::Cli;
use crate::cli::output::OutputWriter;

/// Services shared by every command
pub struct CliContext {
    pub app: AppHandle,

    /// Output writer configured based on CLI flags
    pub output: OutputWriter,
}

impl CliContext {
    /// Create a new CLI context from parsed CLI arguments
    pub async fn new(cli: &Cli) -> Result<Self> {
        let mut config = Self::load_config(cli.config.as_deref())?;
        if cli.verbose {
            config.logging.level = "debug".to_string();
        }
        if let Some(url) = &cli.database {
            config.store.backend = scanlens_core::config::StoreBackend::Sqlite;
            config.store.database_url = url.clone();
        }

        scanlens_core::init_tracing(&config.logging).context("Failed to initialize logging")?;

        let app = create_app(config)
            .await
            .context("Failed to open report store")?;
        let output = OutputWriter::new(cli.format, cli.quiet);

        Ok(Self { app, output })
    }

    /// Load configuration from an explicit file, or from the default layers.
    ///
    /// An explicit file must exist; without one, a broken layer falls back to
    /// defaults.
    fn load_config(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => Config::load_with_file(Some(path))
                .with_context(|| format!("Failed to load configuration from {:?}", path)),
            None => Ok(Config::load().unwrap_or_else(|e| {
                eprintln!("Warning: {}; using default configuration", e);
                Config::default()
            })),
        }
    }
}
