//! Report ingestion sessions
//!
//! A session owns one tokenizer and one reducer. Chunks are tokenized
//! synchronously until the reducer holds `max_pending_records` completed
//! records; those are written to the store in document order before
//! tokenizing resumes. A failed session leaves a partial report in the
//! store, which [`ingest_reader`] discards.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use scanlens_core::Config;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use super::errors::IngestError;
use crate::infrastructure::parser::{ParseError, Tokenizer};
use crate::infrastructure::reducer::{Flush, ReportReducer};
use crate::infrastructure::store::ReportStore;

/// Outcome of a completed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionSummary {
    pub session_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub bytes: u64,
    pub index_tables: u64,
    pub paths: u64,
    pub operations: u64,
    pub issues: u64,
    pub skipped_issues: u64,
}

#[derive(Debug, Default)]
struct Counters {
    bytes: u64,
    index_tables: u64,
    paths: u64,
    operations: u64,
    issues: u64,
    skipped_issues: u64,
}

/// One report being streamed into a store
pub struct IngestionSession {
    id: Uuid,
    started_at: DateTime<Utc>,
    store: Arc<dyn ReportStore>,
    tokenizer: Tokenizer,
    reducer: ReportReducer,
    counters: Counters,
    failure: Option<String>,
    closed: bool,
}

impl std::fmt::Debug for IngestionSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestionSession")
            .field("id", &self.id)
            .field("started_at", &self.started_at)
            .field("depth", &self.reducer.depth())
            .field("closed", &self.closed)
            .finish()
    }
}

impl IngestionSession {
    /// Clear `store` and begin a new session.
    #[instrument(skip(store, config))]
    pub async fn start(store: Arc<dyn ReportStore>, config: &Config) -> Result<Self, IngestError> {
        let id = Uuid::new_v4();
        store.clear().await?;
        info!(session_id = %id, "Started ingestion session");

        Ok(Self {
            id,
            started_at: Utc::now(),
            store,
            tokenizer: Tokenizer::with_config(&config.parser),
            reducer: ReportReducer::new(config.ingestion.issue_error_policy)
                .with_max_pending(config.ingestion.max_pending_records),
            counters: Counters::default(),
            failure: None,
            closed: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Feed a text chunk.
    pub async fn write(&mut self, chunk: &str) -> Result<(), IngestError> {
        self.ensure_open()?;
        self.counters.bytes += chunk.len() as u64;

        let mut rest = chunk;
        while !rest.is_empty() {
            let result = self.tokenizer.write_partial(rest, &mut self.reducer);
            let consumed = result.as_ref().map_or(rest.len(), |n| *n);
            self.after_tokenize(result.map(|_| ())).await?;
            rest = &rest[consumed..];
        }
        Ok(())
    }

    /// Feed a byte chunk; UTF-8 sequences may be split between chunks.
    pub async fn write_bytes(&mut self, chunk: &[u8]) -> Result<(), IngestError> {
        self.ensure_open()?;
        self.counters.bytes += chunk.len() as u64;

        let mut rest = chunk;
        while !rest.is_empty() {
            let result = self.tokenizer.write_bytes_partial(rest, &mut self.reducer);
            let consumed = result.as_ref().map_or(rest.len(), |n| *n);
            self.after_tokenize(result.map(|_| ())).await?;
            rest = &rest[consumed..];
        }
        Ok(())
    }

    /// Chunked input with an end-of-input flag; the final chunk closes the
    /// session and returns its summary.
    pub async fn feed(
        &mut self,
        is_final: bool,
        chunk: &str,
    ) -> Result<Option<IngestionSummary>, IngestError> {
        self.write(chunk).await?;
        if is_final {
            return self.close().await.map(Some);
        }
        Ok(None)
    }

    /// Signal end of input and return the summary.
    pub async fn close(&mut self) -> Result<IngestionSummary, IngestError> {
        self.ensure_open()?;
        let result = self.tokenizer.close(&mut self.reducer);
        self.after_tokenize(result).await?;

        if !self.reducer.is_finished() {
            return Err(self.fail(IngestError::IncompleteDocument));
        }
        self.closed = true;

        let summary = IngestionSummary {
            session_id: self.id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            bytes: self.counters.bytes,
            index_tables: self.counters.index_tables,
            paths: self.counters.paths,
            operations: self.counters.operations,
            issues: self.counters.issues,
            skipped_issues: self.counters.skipped_issues,
        };
        info!(
            session_id = %self.id,
            paths = summary.paths,
            operations = summary.operations,
            issues = summary.issues,
            skipped_issues = summary.skipped_issues,
            "Ingestion completed"
        );
        Ok(summary)
    }

    fn ensure_open(&self) -> Result<(), IngestError> {
        if let Some(message) = &self.failure {
            return Err(IngestError::SessionFailed(message.clone()));
        }
        if self.closed {
            return Err(IngestError::SessionClosed);
        }
        Ok(())
    }

    fn fail(&mut self, error: IngestError) -> IngestError {
        error!(session_id = %self.id, error = %error, "Ingestion failed");
        self.failure = Some(error.to_string());
        error
    }

    async fn after_tokenize(&mut self, result: Result<(), ParseError>) -> Result<(), IngestError> {
        // Records completed before a failure are still written.
        if let Err(e) = self.flush().await {
            return Err(self.fail(e));
        }
        if let Err(e) = result {
            return Err(self.fail(e.into()));
        }
        if let Some(e) = self.reducer.error() {
            let e = e.clone();
            return Err(self.fail(e.into()));
        }
        Ok(())
    }

    /// Write completed records in the order the reducer produced them.
    async fn flush(&mut self) -> Result<(), IngestError> {
        let pending: Vec<Flush> = self.reducer.drain().collect();
        if pending.is_empty() {
            return Ok(());
        }
        debug!(session_id = %self.id, records = pending.len(), "Flushing records");

        for item in pending {
            match item {
                Flush::IndexTable { name, entries } => {
                    self.store.add_index_table(name, &entries).await?;
                    self.counters.index_tables += 1;
                }
                Flush::Issue(issue) => {
                    self.store.add_issue(&issue).await?;
                    self.counters.issues += 1;
                }
                Flush::SkippedIssue => self.counters.skipped_issues += 1,
                Flush::Operation(operation) => {
                    self.store.add_operation(&operation).await?;
                    self.counters.operations += 1;
                }
                Flush::Path(path) => {
                    self.store.add_path(&path).await?;
                    self.counters.paths += 1;
                }
                Flush::Metadata(metadata) => self.store.add_metadata(&metadata).await?,
            }
        }
        Ok(())
    }
}

/// Stream a whole report from `reader` into `store` in configured chunk sizes.
///
/// On failure the store is cleared, so it never serves a partial report.
#[instrument(skip_all)]
pub async fn ingest_reader<R>(
    store: Arc<dyn ReportStore>,
    config: &Config,
    reader: R,
) -> Result<IngestionSummary, IngestError>
where
    R: AsyncRead + Unpin,
{
    let result = stream_report(store.clone(), config, reader).await;
    if let Err(e) = &result {
        match store.clear().await {
            Ok(()) => warn!(error = %e, "Discarded partially ingested report"),
            Err(clear_error) => {
                error!(error = %clear_error, "Failed to discard partially ingested report")
            }
        }
    }
    result
}

async fn stream_report<R>(
    store: Arc<dyn ReportStore>,
    config: &Config,
    mut reader: R,
) -> Result<IngestionSummary, IngestError>
where
    R: AsyncRead + Unpin,
{
    let mut session = IngestionSession::start(store, config).await?;
    let mut buffer = vec![0u8; config.ingestion.chunk_size.max(1)];

    loop {
        let read = reader.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        session.write_bytes(&buffer[..read]).await?;
    }

    session.close().await
}
