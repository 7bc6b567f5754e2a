//! Configuration validation module

use crate::config::{IngestionConfig, LoggingConfig, ParserConfig, QueryConfig, StoreBackend, StoreConfig};

/// Trait for validating configuration sections
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Logging configuration error: {message}")]
    Logging { message: String },

    #[error("Parser configuration error: {message}")]
    Parser { message: String },

    #[error("Ingestion configuration error: {message}")]
    Ingestion { message: String },

    #[error("Store configuration error: {message}")]
    Store { message: String },

    #[error("Query configuration error: {message}")]
    Query { message: String },
}

impl ValidationError {
    pub fn logging(message: impl Into<String>) -> Self {
        Self::Logging {
            message: message.into(),
        }
    }

    pub fn parser(message: impl Into<String>) -> Self {
        Self::Parser {
            message: message.into(),
        }
    }

    pub fn ingestion(message: impl Into<String>) -> Self {
        Self::Ingestion {
            message: message.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

impl Validate for LoggingConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.level.trim().is_empty() {
            return Err(ValidationError::logging("Log level cannot be empty"));
        }

        match self.format.as_str() {
            "json" | "pretty" => Ok(()),
            other => Err(ValidationError::logging(format!(
                "Log format must be 'json' or 'pretty', got '{}'",
                other
            ))),
        }
    }
}

impl Validate for ParserConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.max_buffer_length == 0 {
            return Err(ValidationError::parser(
                "max_buffer_length must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Validate for IngestionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.chunk_size == 0 {
            return Err(ValidationError::ingestion(
                "chunk_size must be greater than 0",
            ));
        }
        if self.max_pending_records == 0 {
            return Err(ValidationError::ingestion(
                "max_pending_records must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl Validate for StoreConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StoreBackend::Sqlite && !self.database_url.starts_with("sqlite:") {
            return Err(ValidationError::store(format!(
                "database_url must be a sqlite: URL when backend is sqlite, got '{}'",
                self.database_url
            )));
        }
        Ok(())
    }
}

impl Validate for QueryConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.default_per_page == 0 {
            return Err(ValidationError::query(
                "default_per_page must be greater than 0",
            ));
        }

        if self.max_per_page < self.default_per_page {
            return Err(ValidationError::query(format!(
                "max_per_page ({}) must be >= default_per_page ({})",
                self.max_per_page, self.default_per_page
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_format_rejected() {
        let config = LoggingConfig {
            level: "debug".to_string(),
            format: "xml".to_string(),
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::Logging { .. }));
    }

    #[test]
    fn test_zero_buffer_rejected() {
        let config = ParserConfig {
            max_buffer_length: 0,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_pending_records_rejected() {
        let config = IngestionConfig {
            max_pending_records: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Ingestion { .. })
        ));
    }

    #[test]
    fn test_sqlite_url_required() {
        let config = StoreConfig {
            backend: StoreBackend::Sqlite,
            database_url: "postgres://localhost/db".to_string(),
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::Store { .. })
        ));

        let memory = StoreConfig {
            backend: StoreBackend::Memory,
            database_url: String::new(),
        };
        assert!(memory.validate().is_ok());
    }

    #[test]
    fn test_query_page_bounds() {
        let config = QueryConfig {
            default_per_page: 100,
            max_per_page: 10,
        };
        assert!(config.validate().is_err());

        let config = QueryConfig {
            default_per_page: 0,
            max_per_page: 10,
        };
        assert!(config.validate().is_err());
    }
}
