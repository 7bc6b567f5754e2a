//! Report domain entities

use std::collections::BTreeMap;

use scanlens_core::domain::Version;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::errors::DomainError;
use super::value_objects::{
    HttpMethod, IndexTableName, IntegralStatus, OwaspCategory, ResponseClassification, Severity,
};

/// Engine version assumed when `scanVersion` cannot be parsed
pub const FALLBACK_ENGINE_VERSION: Version = Version::new(1, 0, 0);

/// Top-level report metadata, one per ingestion session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanMetadata {
    pub task_id: Option<String>,
    /// Engine version, parsed leniently
    pub scan_version: Option<Version>,
    /// Report schema version, parsed strictly
    pub scan_report_version: Option<Version>,
    pub errors_only: bool,
    pub state: Option<String>,
    pub exit_code: Option<i64>,
    pub total_request: Option<u64>,
    /// Number of issues announced by the report header
    pub issue_count: Option<u64>,
    pub start_date: Option<String>,
}

impl ScanMetadata {
    pub fn builder() -> ScanMetadataBuilder {
        ScanMetadataBuilder::default()
    }
}

/// Collects metadata fields as they stream past
#[derive(Debug, Clone, Default)]
pub struct ScanMetadataBuilder {
    inner: ScanMetadata,
}

impl ScanMetadataBuilder {
    pub fn task_id(mut self, task_id: impl Into<String>) -> Self {
        self.inner.task_id = Some(task_id.into());
        self
    }

    /// Set the engine version, falling back to [`FALLBACK_ENGINE_VERSION`]
    /// when the string cannot be cleaned into a version.
    pub fn scan_version(mut self, raw: &str) -> Self {
        self.inner.scan_version = Some(Version::parse_lenient(raw, FALLBACK_ENGINE_VERSION));
        self
    }

    pub fn scan_report_version(mut self, version: Version) -> Self {
        self.inner.scan_report_version = Some(version);
        self
    }

    pub fn errors_only(mut self, errors_only: bool) -> Self {
        self.inner.errors_only = errors_only;
        self
    }

    pub fn state(mut self, state: impl Into<String>) -> Self {
        self.inner.state = Some(state.into());
        self
    }

    pub fn exit_code(mut self, exit_code: i64) -> Self {
        self.inner.exit_code = Some(exit_code);
        self
    }

    pub fn total_request(mut self, total_request: u64) -> Self {
        self.inner.total_request = Some(total_request);
        self
    }

    pub fn issue_count(mut self, issue_count: u64) -> Self {
        self.inner.issue_count = Some(issue_count);
        self
    }

    pub fn start_date(mut self, start_date: impl Into<String>) -> Self {
        self.inner.start_date = Some(start_date.into());
        self
    }

    /// Metadata as recorded so far
    pub fn snapshot(&self) -> ScanMetadata {
        self.inner.clone()
    }

    /// Report version as recorded so far
    pub fn report_version(&self) -> Option<Version> {
        self.inner.scan_report_version.clone()
    }

    pub fn build(self) -> ScanMetadata {
        self.inner
    }
}

/// Side tables of deduplicated strings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexTables {
    tables: BTreeMap<IndexTableName, Vec<String>>,
}

impl IndexTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: IndexTableName, entries: Vec<String>) {
        self.tables.insert(name, entries);
    }

    pub fn get(&self, name: IndexTableName) -> Option<&[String]> {
        self.tables.get(&name).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Resolve position `index` in table `name`.
    pub fn lookup(&self, name: IndexTableName, index: u64) -> Result<&str, DomainError> {
        let table = self
            .tables
            .get(&name)
            .ok_or(DomainError::MissingIndexTable(name))?;
        usize::try_from(index)
            .ok()
            .and_then(|i| table.get(i))
            .map(String::as_str)
            .ok_or(DomainError::IndexOutOfRange {
                table: name,
                index,
                len: table.len(),
            })
    }
}

/// A URL path template and the methods recorded under it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathRecord {
    pub path: String,
    pub methods: Vec<HttpMethod>,
}

/// Per-status issue tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub expected_conformity_success: u64,
    pub unexpected_conformity_success: u64,
    pub successful_conformity_success: u64,
    pub expected_conformity_failure: u64,
    pub unexpected_conformity_failure: u64,
    pub successful_conformity_failure: u64,
}

impl StatusCounts {
    fn slot(&mut self, status: IntegralStatus) -> &mut u64 {
        match status {
            IntegralStatus::ExpectedConformitySuccess => &mut self.expected_conformity_success,
            IntegralStatus::UnexpectedConformitySuccess => &mut self.unexpected_conformity_success,
            IntegralStatus::SuccessfulConformitySuccess => {
                &mut self.successful_conformity_success
            }
            IntegralStatus::ExpectedConformityFailure => &mut self.expected_conformity_failure,
            IntegralStatus::UnexpectedConformityFailure => &mut self.unexpected_conformity_failure,
            IntegralStatus::SuccessfulConformityFailure => {
                &mut self.successful_conformity_failure
            }
        }
    }

    pub fn increment(&mut self, status: IntegralStatus) {
        *self.slot(status) += 1;
    }

    pub fn get(&self, status: IntegralStatus) -> u64 {
        match status {
            IntegralStatus::ExpectedConformitySuccess => self.expected_conformity_success,
            IntegralStatus::UnexpectedConformitySuccess => self.unexpected_conformity_success,
            IntegralStatus::SuccessfulConformitySuccess => self.successful_conformity_success,
            IntegralStatus::ExpectedConformityFailure => self.expected_conformity_failure,
            IntegralStatus::UnexpectedConformityFailure => self.unexpected_conformity_failure,
            IntegralStatus::SuccessfulConformityFailure => self.successful_conformity_failure,
        }
    }

    pub fn total(&self) -> u64 {
        IntegralStatus::ALL.iter().map(|s| self.get(*s)).sum()
    }

    pub fn add(&mut self, other: &StatusCounts) {
        for status in IntegralStatus::ALL {
            *self.slot(status) += other.get(status);
        }
    }
}

/// One analysed response of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseAnalysis {
    pub response_key: String,
    pub response_description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    pub url: Option<String>,
    pub method: Option<String>,
    pub content_type: Option<String>,
    pub body_length: Option<u64>,
    pub timestamp: Option<String>,
    /// Reproduction command
    pub curl: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseDetails {
    pub http_status_code: Option<u16>,
    pub content_type: Option<String>,
    pub body_length: Option<u64>,
    pub timestamp: Option<String>,
    /// Round trip time in milliseconds
    pub duration: Option<f64>,
}

/// A single conformance test result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub id: String,
    pub path: String,
    pub method: HttpMethod,
    pub injection_key: Option<String>,
    pub injection_description: Option<String>,
    pub response_analysis: Vec<ResponseAnalysis>,
    pub criticality: u8,
    pub severity: Severity,
    pub owasp: OwaspCategory,
    pub json_pointer: Option<String>,
    pub request: Option<RequestDetails>,
    pub response: Option<ResponseDetails>,
    pub classification: ResponseClassification,
    /// Exactly one response analysis entry
    pub is_contract_conforming: bool,
    pub integral_status: IntegralStatus,
}

impl Issue {
    pub fn has_owasp_issue(&self) -> bool {
        !self.owasp.is_none()
    }

    /// Human readable conformance label
    pub fn conformance_label(&self) -> &'static str {
        if self.is_contract_conforming {
            "conforming"
        } else {
            "non-conforming"
        }
    }
}

/// Baseline request/response recorded for an operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HappyPathDetails {
    pub success: bool,
    pub response_analysis: Vec<ResponseAnalysis>,
    pub json_pointer: Option<String>,
    pub request: Option<RequestDetails>,
    pub response: Option<ResponseDetails>,
    pub classification: ResponseClassification,
    pub is_contract_conforming: bool,
}

/// A `(path, method)` operation with its aggregate counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationRecord {
    pub path: String,
    pub method: HttpMethod,
    pub checked: bool,
    pub skip_reason: Option<String>,
    pub skip_reason_details: Option<Value>,
    pub total_request: u64,
    pub total_expected: u64,
    pub total_unexpected: u64,
    pub total_failure: u64,
    pub happy_path: Option<HappyPathDetails>,
    /// Stored issues of this operation, by integral status
    pub status_counts: StatusCounts,
    /// Stored issues mapped to an OWASP category
    pub owasp_issue_count: u64,
}

impl OperationRecord {
    pub fn new(path: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            path: path.into(),
            method,
            checked: false,
            skip_reason: None,
            skip_reason_details: None,
            total_request: 0,
            total_expected: 0,
            total_unexpected: 0,
            total_failure: 0,
            happy_path: None,
            status_counts: StatusCounts::default(),
            owasp_issue_count: 0,
        }
    }

    pub fn issue_count(&self) -> u64 {
        self.status_counts.total()
    }
}
