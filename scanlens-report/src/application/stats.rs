//! Aggregate statistics
//!
//! Operation counters are folded into path totals, and path totals into
//! report totals. All folds are additive.

use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use crate::domain::{HttpMethod, OperationRecord, StatusCounts};
use crate::infrastructure::store::{ReportStore, StoreError};

/// Additive counters shared by every aggregation level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub requests: u64,
    pub expected: u64,
    pub unexpected: u64,
    pub failure: u64,
    pub happy_path_success: u64,
    pub happy_path_failure: u64,
    pub status_counts: StatusCounts,
    pub owasp_issue_count: u64,
    pub checked_operations: u64,
    pub skipped_operations: u64,
}

impl Totals {
    pub fn from_operation(operation: &OperationRecord) -> Self {
        let (happy_path_success, happy_path_failure) = match &operation.happy_path {
            Some(happy) if happy.success => (1, 0),
            Some(_) => (0, 1),
            None => (0, 0),
        };
        Self {
            requests: operation.total_request,
            expected: operation.total_expected,
            unexpected: operation.total_unexpected,
            failure: operation.total_failure,
            happy_path_success,
            happy_path_failure,
            status_counts: operation.status_counts,
            owasp_issue_count: operation.owasp_issue_count,
            checked_operations: u64::from(operation.checked),
            skipped_operations: u64::from(!operation.checked),
        }
    }

    pub fn add(&mut self, other: &Totals) {
        self.requests += other.requests;
        self.expected += other.expected;
        self.unexpected += other.unexpected;
        self.failure += other.failure;
        self.happy_path_success += other.happy_path_success;
        self.happy_path_failure += other.happy_path_failure;
        self.status_counts.add(&other.status_counts);
        self.owasp_issue_count += other.owasp_issue_count;
        self.checked_operations += other.checked_operations;
        self.skipped_operations += other.skipped_operations;
    }

    /// Number of test results available for display.
    ///
    /// Errors-only reports never recorded passing requests, so the sum comes
    /// from the integral-status buckets instead of the request counter.
    pub fn total_tested_count(&self, errors_only: bool) -> u64 {
        if errors_only {
            self.status_counts.total()
        } else {
            self.requests
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationStats {
    pub method: HttpMethod,
    pub checked: bool,
    pub skip_reason: Option<String>,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PathStats {
    pub path: String,
    pub operations: Vec<OperationStats>,
    pub totals: Totals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportStats {
    pub errors_only: bool,
    pub paths: Vec<PathStats>,
    pub totals: Totals,
    pub total_tested_count: u64,
}

impl ReportStats {
    /// Fold operations, already ordered by `(path, method)`, into path and
    /// report totals.
    pub fn fold(errors_only: bool, operations: Vec<OperationRecord>) -> Self {
        let mut paths: Vec<PathStats> = Vec::new();
        let mut totals = Totals::default();

        for operation in operations {
            let op_totals = Totals::from_operation(&operation);
            totals.add(&op_totals);

            let stats = OperationStats {
                method: operation.method,
                checked: operation.checked,
                skip_reason: operation.skip_reason,
                totals: op_totals,
            };
            match paths.last_mut() {
                Some(last) if last.path == operation.path => {
                    last.totals.add(&op_totals);
                    last.operations.push(stats);
                }
                _ => paths.push(PathStats {
                    path: operation.path,
                    operations: vec![stats],
                    totals: op_totals,
                }),
            }
        }

        Self {
            errors_only,
            paths,
            total_tested_count: totals.total_tested_count(errors_only),
            totals,
        }
    }
}

/// Computes [`ReportStats`] from a populated store
pub struct StatsService {
    store: Arc<dyn ReportStore>,
}

impl StatsService {
    pub fn new(store: Arc<dyn ReportStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn compute(&self) -> Result<ReportStats, StoreError> {
        let errors_only = self
            .store
            .get_metadata()
            .await?
            .is_some_and(|m| m.errors_only);

        let mut operations = self.store.list_operations().await?;
        operations.sort_by(|a, b| (&a.path, a.method).cmp(&(&b.path, b.method)));
        let mut stats = ReportStats::fold(errors_only, operations);

        // Paths stored without any recognised operation still get a row.
        for record in self.store.list_paths().await? {
            if !stats.paths.iter().any(|p| p.path == record.path) {
                stats.paths.push(PathStats {
                    path: record.path,
                    operations: Vec::new(),
                    totals: Totals::default(),
                });
            }
        }
        stats.paths.sort_by(|a, b| a.path.cmp(&b.path));

        tracing::debug!(
            paths = stats.paths.len(),
            total_tested = stats.total_tested_count,
            "Computed report stats"
        );
        Ok(stats)
    }
}
