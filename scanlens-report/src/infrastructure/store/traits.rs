//! Report store abstraction

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{
    HttpMethod, IndexTableName, Issue, OperationRecord, PathRecord, ScanMetadata,
};

/// Errors that can occur during store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Duplicate key in {table}: {key}")]
    DuplicateKey { table: &'static str, key: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid data in {table}: {message}")]
    InvalidData { table: &'static str, message: String },
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Which issues a scan returns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueScope {
    All,
    /// Issues of exactly this path
    Path(String),
    /// Issues of this path and every path below it
    PathPrefix(String),
    /// Issues of one `(path, method)` operation
    Operation { path: String, method: HttpMethod },
}

impl IssueScope {
    pub fn contains(&self, path: &str, method: HttpMethod) -> bool {
        match self {
            IssueScope::All => true,
            IssueScope::Path(p) => p == path,
            IssueScope::PathPrefix(prefix) => is_sub_path(path, prefix),
            IssueScope::Operation { path: p, method: m } => p == path && *m == method,
        }
    }
}

/// Segment-aware prefix match: `/pets` covers `/pets` and `/pets/{id}` but not `/petshop`.
pub fn is_sub_path(path: &str, prefix: &str) -> bool {
    if prefix.is_empty() || prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || prefix.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

/// The text prefix that every sub-path of `prefix` other than itself starts with
pub fn sub_path_prefix(prefix: &str) -> String {
    if prefix.ends_with('/') {
        prefix.to_string()
    } else {
        format!("{}/", prefix)
    }
}

/// Storage for one ingested report
///
/// A store holds a single report at a time. Ingestion clears it before the
/// first write. Issues are returned in the order they were added.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Remove every record
    async fn clear(&self) -> Result<(), StoreError>;

    /// Store the report metadata, replacing any previous value
    async fn add_metadata(&self, metadata: &ScanMetadata) -> Result<(), StoreError>;

    async fn get_metadata(&self) -> Result<Option<ScanMetadata>, StoreError>;

    async fn add_index_table(
        &self,
        name: IndexTableName,
        entries: &[String],
    ) -> Result<(), StoreError>;

    async fn get_index_table(&self, name: IndexTableName)
    -> Result<Option<Vec<String>>, StoreError>;

    /// Paths are unique; adding one twice is a [`StoreError::DuplicateKey`]
    async fn add_path(&self, path: &PathRecord) -> Result<(), StoreError>;

    async fn get_path(&self, path: &str) -> Result<Option<PathRecord>, StoreError>;

    /// All paths ordered by path string
    async fn list_paths(&self) -> Result<Vec<PathRecord>, StoreError>;

    /// Operations are unique per `(path, method)`
    async fn add_operation(&self, operation: &OperationRecord) -> Result<(), StoreError>;

    async fn get_operation(
        &self,
        path: &str,
        method: HttpMethod,
    ) -> Result<Option<OperationRecord>, StoreError>;

    /// All operations ordered by `(path, method)`
    async fn list_operations(&self) -> Result<Vec<OperationRecord>, StoreError>;

    async fn add_issue(&self, issue: &Issue) -> Result<(), StoreError>;

    /// Issue ids are only unique within an operation, so several may match
    async fn issues_by_id(&self, id: &str) -> Result<Vec<Issue>, StoreError>;

    /// Issues within `scope`, in insertion order
    async fn scan_issues(&self, scope: &IssueScope) -> Result<Vec<Issue>, StoreError>;

    async fn count_issues(&self) -> Result<u64, StoreError>;
}
