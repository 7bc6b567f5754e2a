//! In-memory report store

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::traits::{IssueScope, ReportStore, StoreError, sub_path_prefix};
use crate::domain::{
    HttpMethod, IndexTableName, Issue, OperationRecord, PathRecord, ScanMetadata,
};

type OperationKey = (String, HttpMethod);

#[derive(Debug, Default)]
struct MemoryState {
    metadata: Option<ScanMetadata>,
    tables: BTreeMap<IndexTableName, Vec<String>>,
    paths: BTreeMap<String, PathRecord>,
    operations: BTreeMap<OperationKey, OperationRecord>,
    /// Insertion order is document order
    issues: Vec<Issue>,
    by_id: HashMap<String, Vec<usize>>,
    by_operation: BTreeMap<OperationKey, Vec<usize>>,
}

impl MemoryState {
    fn collect(&self, mut positions: Vec<usize>) -> Vec<Issue> {
        positions.sort_unstable();
        positions.dedup();
        positions
            .into_iter()
            .filter_map(|i| self.issues.get(i).cloned())
            .collect()
    }

    /// Issue positions of every operation whose path is in `[from, ..)` and
    /// satisfies `keep`
    fn positions_from(&self, from: &str, keep: impl Fn(&str) -> bool) -> Vec<usize> {
        let start = (from.to_string(), HttpMethod::ALL[0]);
        self.by_operation
            .range(start..)
            .take_while(|((path, _), _)| keep(path.as_str()))
            .flat_map(|(_, positions)| positions.iter().copied())
            .collect()
    }
}

/// Report store held in process memory
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    state: RwLock<MemoryState>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn clear(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        *state = MemoryState::default();
        debug!("Cleared in-memory report store");
        Ok(())
    }

    async fn add_metadata(&self, metadata: &ScanMetadata) -> Result<(), StoreError> {
        self.state.write().await.metadata = Some(metadata.clone());
        Ok(())
    }

    async fn get_metadata(&self) -> Result<Option<ScanMetadata>, StoreError> {
        Ok(self.state.read().await.metadata.clone())
    }

    async fn add_index_table(
        &self,
        name: IndexTableName,
        entries: &[String],
    ) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.tables.contains_key(&name) {
            return Err(StoreError::DuplicateKey {
                table: "index_tables",
                key: name.to_string(),
            });
        }
        state.tables.insert(name, entries.to_vec());
        Ok(())
    }

    async fn get_index_table(
        &self,
        name: IndexTableName,
    ) -> Result<Option<Vec<String>>, StoreError> {
        Ok(self.state.read().await.tables.get(&name).cloned())
    }

    async fn add_path(&self, path: &PathRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        if state.paths.contains_key(&path.path) {
            return Err(StoreError::DuplicateKey {
                table: "paths",
                key: path.path.clone(),
            });
        }
        state.paths.insert(path.path.clone(), path.clone());
        Ok(())
    }

    async fn get_path(&self, path: &str) -> Result<Option<PathRecord>, StoreError> {
        Ok(self.state.read().await.paths.get(path).cloned())
    }

    async fn list_paths(&self) -> Result<Vec<PathRecord>, StoreError> {
        Ok(self.state.read().await.paths.values().cloned().collect())
    }

    async fn add_operation(&self, operation: &OperationRecord) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let key = (operation.path.clone(), operation.method);
        if state.operations.contains_key(&key) {
            return Err(StoreError::DuplicateKey {
                table: "operations",
                key: format!("{} {}", operation.method, operation.path),
            });
        }
        state.operations.insert(key, operation.clone());
        Ok(())
    }

    async fn get_operation(
        &self,
        path: &str,
        method: HttpMethod,
    ) -> Result<Option<OperationRecord>, StoreError> {
        Ok(self
            .state
            .read()
            .await
            .operations
            .get(&(path.to_string(), method))
            .cloned())
    }

    async fn list_operations(&self) -> Result<Vec<OperationRecord>, StoreError> {
        Ok(self.state.read().await.operations.values().cloned().collect())
    }

    async fn add_issue(&self, issue: &Issue) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        let position = state.issues.len();
        state.issues.push(issue.clone());
        state
            .by_id
            .entry(issue.id.clone())
            .or_default()
            .push(position);
        state
            .by_operation
            .entry((issue.path.clone(), issue.method))
            .or_default()
            .push(position);
        Ok(())
    }

    async fn issues_by_id(&self, id: &str) -> Result<Vec<Issue>, StoreError> {
        let state = self.state.read().await;
        let positions = state.by_id.get(id).cloned().unwrap_or_default();
        Ok(state.collect(positions))
    }

    async fn scan_issues(&self, scope: &IssueScope) -> Result<Vec<Issue>, StoreError> {
        let state = self.state.read().await;
        let positions = match scope {
            IssueScope::All => return Ok(state.issues.clone()),
            IssueScope::Path(path) => state.positions_from(path, |p| p == path.as_str()),
            IssueScope::PathPrefix(prefix) if prefix.is_empty() || prefix == "/" => {
                return Ok(state.issues.clone());
            }
            IssueScope::PathPrefix(prefix) => {
                let mut positions = state.positions_from(prefix, |p| p == prefix.as_str());
                let below = sub_path_prefix(prefix);
                positions.extend(state.positions_from(&below, |p| p.starts_with(below.as_str())));
                positions
            }
            IssueScope::Operation { path, method } => state
                .by_operation
                .get(&(path.clone(), *method))
                .cloned()
                .unwrap_or_default(),
        };
        Ok(state.collect(positions))
    }

    async fn count_issues(&self) -> Result<u64, StoreError> {
        Ok(self.state.read().await.issues.len() as u64)
    }
}
