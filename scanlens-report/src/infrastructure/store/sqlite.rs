//! SQLite-backed report store
//!
//! Records are stored as JSON bodies next to the columns they are keyed and
//! scanned by:
//! - `paths` keyed by path
//! - `operations` keyed by `(path, method)`
//! - `issues` keyed by insertion sequence, indexed by `id` and `(path, method)`

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, error, info, instrument};

use super::traits::{IssueScope, ReportStore, StoreError, sub_path_prefix};
use crate::domain::{
    HttpMethod, IndexTableName, Issue, OperationRecord, PathRecord, ScanMetadata,
};

const SCHEMA: [&str; 7] = [
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        id INTEGER PRIMARY KEY CHECK (id = 1),
        body TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS index_tables (
        name TEXT PRIMARY KEY,
        entries TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS paths (
        path TEXT PRIMARY KEY,
        methods TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS operations (
        path TEXT NOT NULL,
        method TEXT NOT NULL,
        body TEXT NOT NULL,
        PRIMARY KEY (path, method)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS issues (
        seq INTEGER PRIMARY KEY,
        id TEXT NOT NULL,
        path TEXT NOT NULL,
        method TEXT NOT NULL,
        body TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS issues_by_id ON issues (id, seq)",
    "CREATE INDEX IF NOT EXISTS issues_by_operation ON issues (path, method, seq)",
];

const TABLES: [&str; 5] = ["metadata", "index_tables", "paths", "operations", "issues"];

#[derive(Debug, sqlx::FromRow)]
struct BodyRow {
    body: String,
}

#[derive(Debug, sqlx::FromRow)]
struct PathRow {
    path: String,
    methods: String,
}

#[derive(Debug, sqlx::FromRow)]
struct IndexTableRow {
    entries: String,
}

/// Report store persisted in a SQLite database
#[derive(Debug, Clone)]
pub struct SqliteReportStore {
    pool: SqlitePool,
}

impl SqliteReportStore {
    /// Open (creating if needed) the database at `url` and apply the schema.
    ///
    /// A single connection is used so that `sqlite::memory:` databases live
    /// as long as the store and writes are applied in call order.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None::<Duration>)
            .max_lifetime(None::<Duration>)
            .connect_with(options)
            .await
            .map_err(|e| {
                error!(url, error = %e, "Failed to open report database");
                StoreError::Database(e)
            })?;

        let store = Self::from_pool(pool);
        store.migrate().await?;
        info!(url, "Opened SQLite report store");
        Ok(store)
    }

    /// Wrap an existing pool. The schema must already be applied; see [`Self::migrate`].
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    fn map_insert_error(table: &'static str, key: String) -> impl FnOnce(sqlx::Error) -> StoreError {
        move |e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::DuplicateKey { table, key }
            }
            _ => StoreError::Database(e),
        }
    }
}

fn encode<T: Serialize>(value: &T) -> Result<String, StoreError> {
    Ok(serde_json::to_string(value)?)
}

fn decode<T: DeserializeOwned>(table: &'static str, body: &str) -> Result<T, StoreError> {
    serde_json::from_str(body).map_err(|e| StoreError::InvalidData {
        table,
        message: e.to_string(),
    })
}

fn decode_rows<T: DeserializeOwned>(
    table: &'static str,
    rows: Vec<BodyRow>,
) -> Result<Vec<T>, StoreError> {
    rows.into_iter().map(|row| decode(table, &row.body)).collect()
}

#[async_trait]
impl ReportStore for SqliteReportStore {
    #[instrument(skip(self))]
    async fn clear(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        for table in TABLES {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        debug!("Cleared SQLite report store");
        Ok(())
    }

    async fn add_metadata(&self, metadata: &ScanMetadata) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO metadata (id, body) VALUES (1, ?)")
            .bind(encode(metadata)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_metadata(&self) -> Result<Option<ScanMetadata>, StoreError> {
        let row = sqlx::query_as::<_, BodyRow>("SELECT body FROM metadata WHERE id = 1")
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| decode("metadata", &r.body)).transpose()
    }

    async fn add_index_table(
        &self,
        name: IndexTableName,
        entries: &[String],
    ) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO index_tables (name, entries) VALUES (?, ?)")
            .bind(name.as_str())
            .bind(encode(&entries)?)
            .execute(&self.pool)
            .await
            .map_err(Self::map_insert_error("index_tables", name.to_string()))?;
        Ok(())
    }

    async fn get_index_table(
        &self,
        name: IndexTableName,
    ) -> Result<Option<Vec<String>>, StoreError> {
        let row = sqlx::query_as::<_, IndexTableRow>(
            "SELECT entries FROM index_tables WHERE name = ?",
        )
        .bind(name.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| decode("index_tables", &r.entries)).transpose()
    }

    async fn add_path(&self, path: &PathRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO paths (path, methods) VALUES (?, ?)")
            .bind(&path.path)
            .bind(encode(&path.methods)?)
            .execute(&self.pool)
            .await
            .map_err(Self::map_insert_error("paths", path.path.clone()))?;
        Ok(())
    }

    async fn get_path(&self, path: &str) -> Result<Option<PathRecord>, StoreError> {
        let row = sqlx::query_as::<_, PathRow>("SELECT path, methods FROM paths WHERE path = ?")
            .bind(path)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| {
            Ok(PathRecord {
                methods: decode("paths", &r.methods)?,
                path: r.path,
            })
        })
        .transpose()
    }

    async fn list_paths(&self) -> Result<Vec<PathRecord>, StoreError> {
        let rows = sqlx::query_as::<_, PathRow>("SELECT path, methods FROM paths ORDER BY path")
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter()
            .map(|r| {
                Ok(PathRecord {
                    methods: decode("paths", &r.methods)?,
                    path: r.path,
                })
            })
            .collect()
    }

    async fn add_operation(&self, operation: &OperationRecord) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO operations (path, method, body) VALUES (?, ?, ?)")
            .bind(&operation.path)
            .bind(operation.method.as_str())
            .bind(encode(operation)?)
            .execute(&self.pool)
            .await
            .map_err(Self::map_insert_error(
                "operations",
                format!("{} {}", operation.method, operation.path),
            ))?;
        Ok(())
    }

    async fn get_operation(
        &self,
        path: &str,
        method: HttpMethod,
    ) -> Result<Option<OperationRecord>, StoreError> {
        let row = sqlx::query_as::<_, BodyRow>(
            "SELECT body FROM operations WHERE path = ? AND method = ?",
        )
        .bind(path)
        .bind(method.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(|r| decode("operations", &r.body)).transpose()
    }

    async fn list_operations(&self) -> Result<Vec<OperationRecord>, StoreError> {
        let rows =
            sqlx::query_as::<_, BodyRow>("SELECT body FROM operations ORDER BY path, method")
                .fetch_all(&self.pool)
                .await?;
        decode_rows("operations", rows)
    }

    async fn add_issue(&self, issue: &Issue) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO issues (id, path, method, body) VALUES (?, ?, ?, ?)")
            .bind(&issue.id)
            .bind(&issue.path)
            .bind(issue.method.as_str())
            .bind(encode(issue)?)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn issues_by_id(&self, id: &str) -> Result<Vec<Issue>, StoreError> {
        let rows = sqlx::query_as::<_, BodyRow>("SELECT body FROM issues WHERE id = ? ORDER BY seq")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        decode_rows("issues", rows)
    }

    #[instrument(skip(self))]
    async fn scan_issues(&self, scope: &IssueScope) -> Result<Vec<Issue>, StoreError> {
        let rows = match scope {
            IssueScope::All => {
                sqlx::query_as::<_, BodyRow>("SELECT body FROM issues ORDER BY seq")
                    .fetch_all(&self.pool)
                    .await?
            }
            IssueScope::Path(path) => {
                sqlx::query_as::<_, BodyRow>("SELECT body FROM issues WHERE path = ? ORDER BY seq")
                    .bind(path)
                    .fetch_all(&self.pool)
                    .await?
            }
            IssueScope::PathPrefix(prefix) if prefix.is_empty() || prefix == "/" => {
                sqlx::query_as::<_, BodyRow>("SELECT body FROM issues ORDER BY seq")
                    .fetch_all(&self.pool)
                    .await?
            }
            IssueScope::PathPrefix(prefix) => {
                let below = sub_path_prefix(prefix);
                sqlx::query_as::<_, BodyRow>(
                    r#"
                    SELECT body FROM issues
                    WHERE path = ? OR substr(path, 1, length(?)) = ?
                    ORDER BY seq
                    "#,
                )
                .bind(prefix)
                .bind(&below)
                .bind(&below)
                .fetch_all(&self.pool)
                .await?
            }
            IssueScope::Operation { path, method } => {
                sqlx::query_as::<_, BodyRow>(
                    "SELECT body FROM issues WHERE path = ? AND method = ? ORDER BY seq",
                )
                .bind(path)
                .bind(method.as_str())
                .fetch_all(&self.pool)
                .await?
            }
        };
        let issues: Vec<Issue> = decode_rows("issues", rows)?;
        debug!(count = issues.len(), "Scanned issues");
        Ok(issues)
    }

    async fn count_issues(&self) -> Result<u64, StoreError> {
        let (count,) = sqlx::query_as::<_, (i64,)>("SELECT COUNT(*) FROM issues")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
