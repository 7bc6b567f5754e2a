//! Application errors

use thiserror::Error;

use crate::infrastructure::parser::ParseError;
use crate::infrastructure::reducer::ReduceError;
use crate::infrastructure::store::StoreError;

/// Terminal failure of an ingestion session
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Report error: {0}")]
    Reduce(#[from] ReduceError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Report ended before its root object closed")]
    IncompleteDocument,

    #[error("Ingestion session is already closed")]
    SessionClosed,

    #[error("Ingestion session failed earlier: {0}")]
    SessionFailed(String),
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Invalid page size {per_page}: must be between 1 and {max}")]
    InvalidPageSize { per_page: usize, max: usize },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
