//! Scanlens Report - streaming ingestion and indexing of API conformance scan reports
//!
//! A report is consumed chunk by chunk. Nothing holds the whole document in
//! memory; records are written to the store as soon as they are complete.
//!
//! ## Pipeline
//!
//! - [`infrastructure::parser`]: incremental JSON tokenizer emitting events
//! - [`infrastructure::reducer`]: frame-stack reducer turning events into records
//! - [`infrastructure::resolver`]: index table lookup and description templating
//! - [`infrastructure::store`]: in-memory and SQLite report stores
//! - [`application`]: ingestion sessions, filtered issue queries and stats
//!
//! ## Usage
//!
//! ```rust,ignore
//! use scanlens_core::Config;
//! use scanlens_report::{IngestionSession, InMemoryReportStore};
//!
//! let store = std::sync::Arc::new(InMemoryReportStore::new());
//! let mut session = IngestionSession::start(store, &Config::default()).await?;
//! session.write(r#"{"paths": {}}"#).await?;
//! let summary = session.close().await?;
//! ```

pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::{
    IngestError, IngestionSession, IngestionSummary, IssueFilter, IssuePage, IssueQuery,
    PathFilter, QueryError, QueryService, ReportStats, SortOrder, StatsService, StatusFilter,
    ingest_reader,
};
pub use infrastructure::store::{
    InMemoryReportStore, IssueScope, ReportStore, SqliteReportStore, StoreError, open_store,
};
