//! Test helpers

use std::sync::Arc;

use scanlens_core::Config;
use scanlens_core::config::IssueErrorPolicy;
use scanlens_report::{
    IngestError, IngestionSession, IngestionSummary, InMemoryReportStore, ReportStore,
    SqliteReportStore,
};
use tempfile::TempDir;

pub fn test_config(policy: IssueErrorPolicy) -> Config {
    let mut config = Config::default();
    config.ingestion.issue_error_policy = policy;
    config
}

pub fn memory_store() -> Arc<dyn ReportStore> {
    Arc::new(InMemoryReportStore::new())
}

/// File-backed store; keep the directory alive for the store's lifetime
pub async fn sqlite_store() -> (Arc<dyn ReportStore>, TempDir) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let url = format!("sqlite://{}", dir.path().join("report.db").display());
    let store = SqliteReportStore::connect(&url)
        .await
        .expect("Failed to open sqlite store");
    (Arc::new(store), dir)
}

/// Ingest `report` in character chunks of `chunk_chars`
pub async fn ingest_chunked(
    store: Arc<dyn ReportStore>,
    config: &Config,
    report: &str,
    chunk_chars: usize,
) -> Result<IngestionSummary, IngestError> {
    let mut session = IngestionSession::start(store, config).await?;
    let chars: Vec<char> = report.chars().collect();
    for chunk in chars.chunks(chunk_chars.max(1)) {
        let text: String = chunk.iter().collect();
        session.write(&text).await?;
    }
    session.close().await
}

pub async fn ingest(
    store: Arc<dyn ReportStore>,
    report: &str,
) -> Result<IngestionSummary, IngestError> {
    ingest_chunked(store, &Config::default(), report, 64).await
}
