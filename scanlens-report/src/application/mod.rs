//! Application layer: ingestion sessions, issue queries and statistics

pub mod errors;
pub mod ingestion;
pub mod query;
pub mod stats;

pub use errors::{IngestError, QueryError};
pub use ingestion::{IngestionSession, IngestionSummary, ingest_reader};
pub use query::{
    IssueFilter, IssuePage, IssueQuery, PathFilter, QueryService, SortOrder, StatusFilter,
    matches_text,
};
pub use stats::{OperationStats, PathStats, ReportStats, StatsService, Totals};
