//! Embedded report store
//!
//! - In-memory backend for tests and one-shot commands
//! - SQLite backend for durable, queryable storage

pub mod memory;
pub mod sqlite;
pub mod traits;

use std::sync::Arc;

use scanlens_core::config::{StoreBackend, StoreConfig};

pub use memory::InMemoryReportStore;
pub use sqlite::SqliteReportStore;
pub use traits::{IssueScope, ReportStore, StoreError, is_sub_path};

/// Open the store selected by configuration
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn ReportStore>, StoreError> {
    match config.backend {
        StoreBackend::Memory => Ok(Arc::new(InMemoryReportStore::new())),
        StoreBackend::Sqlite => Ok(Arc::new(
            SqliteReportStore::connect(&config.database_url).await?,
        )),
    }
}
