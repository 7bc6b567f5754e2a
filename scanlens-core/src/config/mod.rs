//! Configuration management

pub mod validation;

pub use validation::{Validate, ValidationError};

use serde::{Deserialize, Serialize};

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub parser: ParserConfig,
    pub ingestion: IngestionConfig,
    pub store: StoreConfig,
    pub query: QueryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by `RUST_LOG` when set
    pub level: String,
    /// Output format: "json" or "pretty"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// Tokenizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Maximum length (in bytes) of a single scalar token (string or number)
    pub max_buffer_length: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_buffer_length: 64 * 1024 * 1024,
        }
    }
}

/// What to do with an issue that cannot be resolved against the index tables
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueErrorPolicy {
    /// Fail the whole ingestion session
    #[default]
    Abort,
    /// Log the malformed issue, count it and keep going
    Skip,
}

/// Ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestionConfig {
    /// Size (in bytes) of chunks read from a report file
    pub chunk_size: usize,
    pub issue_error_policy: IssueErrorPolicy,
    /// Completed records the reducer may queue before the session writes
    /// them to the store
    pub max_pending_records: usize,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            chunk_size: 64 * 1024,
            issue_error_policy: IssueErrorPolicy::Abort,
            max_pending_records: 1,
        }
    }
}

/// Storage backend for ingested reports
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local store, lost on exit
    Memory,
    /// SQLite database file (or `sqlite::memory:`)
    #[default]
    Sqlite,
}

/// Store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// SQLite connection URL, used when `backend = "sqlite"`
    pub database_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: "sqlite://scanlens.db".to_string(),
        }
    }
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub default_per_page: usize,
    pub max_per_page: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_per_page: 50,
            max_per_page: 1000,
        }
    }
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationError> {
        self.logging.validate()?;
        self.parser.validate()?;
        self.ingestion.validate()?;
        self.store.validate()?;
        self.query.validate()?;
        Ok(())
    }
}

impl Config {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigLoadError> {
        Self::load_with_file(None)
    }

    /// Load configuration, optionally layering an explicit file on top of the defaults
    pub fn load_with_file(path: Option<&std::path::Path>) -> Result<Self, ConfigLoadError> {
        let mut builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false));

        // Add environment-specific config if ENV is set
        if let Ok(env) = std::env::var("ENV") {
            builder = builder
                .add_source(config::File::with_name(&format!("config/{}", env)).required(false));
        }

        builder = builder.add_source(config::File::with_name("config/local").required(false));

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path).required(true));
        }

        // Environment variables last (highest priority)
        builder = builder.add_source(config::Environment::with_prefix("SCANLENS").separator("__"));

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;

        Ok(config)
    }
}

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("Configuration file error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Configuration validation error: {0}")]
    Validation(#[from] ValidationError),
}
