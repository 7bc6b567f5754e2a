//! Domain errors

use thiserror::Error;

use super::value_objects::IndexTableName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Index {index} is out of range for table '{table}' of length {len}")]
    IndexOutOfRange {
        table: IndexTableName,
        index: u64,
        len: usize,
    },

    #[error("Index table '{0}' is not present in the report")]
    MissingIndexTable(IndexTableName),

    #[error("Unknown HTTP method '{0}'")]
    UnknownHttpMethod(String),

    #[error("Unknown integral status '{0}'")]
    UnknownIntegralStatus(String),

    #[error("Unknown severity '{0}'")]
    UnknownSeverity(String),

    #[error("Unknown OWASP category '{0}'")]
    UnknownOwaspCategory(String),

    #[error("OWASP {year} value {value} is out of range")]
    OwaspOutOfRange { year: u16, value: u64 },
}
