//! Stack machine that rebuilds report records from tokenizer events
//!
//! The reducer is a synchronous [`JsonEventSink`]. Completed records are
//! queued as [`Flush`] items which the ingestion session drains and writes
//! to the store in order after each chunk. Issues are flushed one by one as
//! each array element closes, operations when their method object closes and
//! paths when their path object closes, so only the frames on the stack are
//! ever held in memory.

use std::collections::VecDeque;

use scanlens_core::config::IssueErrorPolicy;
use scanlens_core::domain::{Version, VersionError};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::frame::{Frame, IndexTableFrame, IssuesFrame, Link, OperationFrame, PathFrame, ValueFrame};
use super::keys::{OperationKey, RootKey};
use crate::domain::{
    HttpMethod, IndexTableName, IndexTables, Issue, OperationRecord, PathRecord, ScanMetadata,
    ScanMetadataBuilder,
};
use crate::infrastructure::parser::{JsonEvent, JsonEventSink, Scalar};
use crate::infrastructure::resolver::{IndexResolver, ResolveError};

/// A completed record ready to be written
#[derive(Debug, Clone, PartialEq)]
pub enum Flush {
    IndexTable {
        name: IndexTableName,
        entries: Vec<String>,
    },
    Issue(Issue),
    /// An issue dropped under the skip policy
    SkippedIssue,
    Operation(OperationRecord),
    Path(PathRecord),
    Metadata(ScanMetadata),
}

/// Structural or semantic failure while reducing a report
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReduceError {
    #[error("Report root must be an object")]
    RootNotObject,

    #[error("Expected {expected} for '{context}', found {found}")]
    UnexpectedType {
        context: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Invalid number {value} for '{context}'")]
    InvalidNumber { context: String, value: f64 },

    #[error("Invalid scanReportVersion: {0}")]
    ReportVersion(#[from] VersionError),

    #[error("The index section must precede paths")]
    IndexAfterPaths,

    #[error("Issue #{index} of {method} {path}: {source}")]
    Issue {
        path: String,
        method: HttpMethod,
        index: usize,
        source: ResolveError,
    },

    #[error("Happy path of {method} {path}: {source}")]
    HappyPath {
        path: String,
        method: HttpMethod,
        source: ResolveError,
    },
}

/// State shared by all frames
#[derive(Debug)]
struct ReduceContext {
    policy: IssueErrorPolicy,
    tables: IndexTables,
    metadata: ScanMetadataBuilder,
    paths_started: bool,
    metadata_flushed: bool,
    outbox: VecDeque<Flush>,
}

impl ReduceContext {
    fn report_version(&self) -> Option<Version> {
        self.metadata.report_version()
    }

    fn update_metadata(&mut self, f: impl FnOnce(ScanMetadataBuilder) -> ScanMetadataBuilder) {
        let builder = std::mem::take(&mut self.metadata);
        self.metadata = f(builder);
    }

    /// Queue the metadata as recorded so far. Back-to-back snapshots
    /// collapse into the latest one.
    fn flush_metadata(&mut self) {
        let snapshot = self.metadata.snapshot();
        match self.outbox.back_mut() {
            Some(Flush::Metadata(pending)) => *pending = snapshot,
            _ => self.outbox.push_back(Flush::Metadata(snapshot)),
        }
        self.metadata_flushed = true;
    }

    fn root_value(&mut self, key: &str, scalar: Scalar) -> Result<(), ReduceError> {
        let root_key = RootKey::from_key(key);
        if scalar == Scalar::Null {
            debug!(key, "Ignoring null metadata value");
            return Ok(());
        }

        match root_key {
            RootKey::TaskId => {
                let value = expect_string(key, scalar)?;
                self.update_metadata(|b| b.task_id(value));
            }
            RootKey::ScanVersion => {
                let value = expect_string(key, scalar)?;
                self.update_metadata(|b| b.scan_version(&value));
            }
            RootKey::ScanReportVersion => {
                let version = Version::parse(&expect_string(key, scalar)?)?;
                if self.paths_started {
                    warn!(%version, "scanReportVersion appeared after paths; earlier issues used current key rules");
                }
                self.update_metadata(|b| b.scan_report_version(version));
            }
            RootKey::ErrorsOnly => {
                let value = expect_bool(key, scalar)?;
                self.update_metadata(|b| b.errors_only(value));
            }
            RootKey::State => {
                let value = expect_string(key, scalar)?;
                self.update_metadata(|b| b.state(value));
            }
            RootKey::ExitCode => {
                let value = expect_i64(key, scalar)?;
                self.update_metadata(|b| b.exit_code(value));
            }
            RootKey::TotalRequest => {
                let value = expect_u64(key, scalar)?;
                self.update_metadata(|b| b.total_request(value));
            }
            RootKey::Issues => {
                let value = expect_u64(key, scalar)?;
                self.update_metadata(|b| b.issue_count(value));
            }
            RootKey::StartDate => {
                let value = match scalar {
                    Scalar::Number(_) => Value::from(scalar).to_string(),
                    other => expect_string(key, other)?,
                };
                self.update_metadata(|b| b.start_date(value));
            }
            RootKey::Paths | RootKey::Index => {
                return Err(unexpected(key, "object", scalar_kind(&scalar)));
            }
            RootKey::Other => {
                debug!(key, "Ignoring unknown report key");
                return Ok(());
            }
        }
        self.flush_metadata();
        Ok(())
    }

    fn issue(&mut self, frame: &mut IssuesFrame, raw: Value) -> Result<(), ReduceError> {
        let index = frame.next_index;
        frame.next_index += 1;

        let version = self.report_version();
        let resolved = IndexResolver::new(&self.tables, version.as_ref()).resolve_issue(
            &frame.path,
            frame.method,
            raw,
        );

        match resolved {
            Ok(issue) => {
                frame.status_counts.increment(issue.integral_status);
                if issue.has_owasp_issue() {
                    frame.owasp_issue_count += 1;
                }
                self.outbox.push_back(Flush::Issue(issue));
                Ok(())
            }
            Err(source) => match self.policy {
                IssueErrorPolicy::Abort => Err(ReduceError::Issue {
                    path: frame.path.clone(),
                    method: frame.method,
                    index,
                    source,
                }),
                IssueErrorPolicy::Skip => {
                    warn!(path = %frame.path, method = %frame.method, index, error = %source, "Skipping malformed issue");
                    self.outbox.push_back(Flush::SkippedIssue);
                    Ok(())
                }
            },
        }
    }

    fn happy_path(&mut self, frame: &mut OperationFrame, raw: Value) -> Result<(), ReduceError> {
        let version = self.report_version();
        match IndexResolver::new(&self.tables, version.as_ref()).resolve_happy_path(raw) {
            Ok(details) => {
                frame.set_happy_path(details);
                Ok(())
            }
            Err(source) => match self.policy {
                IssueErrorPolicy::Abort => Err(ReduceError::HappyPath {
                    path: frame.record.path.clone(),
                    method: frame.record.method,
                    source,
                }),
                IssueErrorPolicy::Skip => {
                    warn!(path = %frame.record.path, method = %frame.record.method, error = %source, "Dropping malformed happy path");
                    Ok(())
                }
            },
        }
    }
}

/// Reduces one report into [`Flush`] items
#[derive(Debug)]
pub struct ReportReducer {
    stack: Vec<Frame>,
    key: Option<String>,
    ctx: ReduceContext,
    max_pending: usize,
    error: Option<ReduceError>,
    finished: bool,
}

impl ReportReducer {
    pub fn new(policy: IssueErrorPolicy) -> Self {
        Self {
            stack: Vec::new(),
            key: None,
            ctx: ReduceContext {
                policy,
                tables: IndexTables::new(),
                metadata: ScanMetadataBuilder::default(),
                paths_started: false,
                metadata_flushed: false,
                outbox: VecDeque::new(),
            },
            max_pending: usize::MAX,
            error: None,
            finished: false,
        }
    }

    /// Ask the tokenizer to pause once `max_pending` records are queued.
    pub fn with_max_pending(mut self, max_pending: usize) -> Self {
        self.max_pending = max_pending.max(1);
        self
    }

    pub fn pending(&self) -> usize {
        self.ctx.outbox.len()
    }

    /// Take the records completed since the last drain, in document order.
    pub fn drain(&mut self) -> impl Iterator<Item = Flush> + '_ {
        self.ctx.outbox.drain(..)
    }

    pub fn error(&self) -> Option<&ReduceError> {
        self.error.as_ref()
    }

    /// The root object closed
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn tables(&self) -> &IndexTables {
        &self.ctx.tables
    }

    fn value(&mut self, scalar: Scalar) -> Result<(), ReduceError> {
        let key = self.key.take();
        let Some(top) = self.stack.last_mut() else {
            return Err(ReduceError::RootNotObject);
        };

        match top {
            Frame::Report => self.ctx.root_value(key.as_deref().unwrap_or_default(), scalar),
            Frame::Paths => Err(unexpected(
                key.as_deref().unwrap_or("paths"),
                "object",
                scalar_kind(&scalar),
            )),
            Frame::Path(path) => {
                let key = key.unwrap_or_default();
                if key.parse::<HttpMethod>().is_ok() {
                    Err(unexpected(
                        &format!("{} {}", path.path, key),
                        "object",
                        scalar_kind(&scalar),
                    ))
                } else {
                    debug!(path = %path.path, key, "Ignoring non-method path key");
                    Ok(())
                }
            }
            Frame::Operation(op) => operation_value(op, key.as_deref().unwrap_or_default(), scalar),
            Frame::Issues(issues) => self.ctx.issue(issues, scalar.into()),
            Frame::Index => {
                let key = key.unwrap_or_default();
                if IndexTableName::from_key(&key).is_some() {
                    Err(unexpected(&key, "array", scalar_kind(&scalar)))
                } else {
                    Ok(())
                }
            }
            Frame::IndexTable(table) => {
                let context = table.name.as_str();
                table.entries.push(expect_string(context, scalar)?);
                Ok(())
            }
            Frame::Value(value) => {
                let link = value.child_link(key);
                value.insert(link, scalar.into());
                Ok(())
            }
            Frame::Skip => Ok(()),
        }
    }

    fn open(&mut self, is_object: bool) -> Result<(), ReduceError> {
        let key = self.key.take();
        let found = if is_object { "object" } else { "array" };

        let frame = match self.stack.last_mut() {
            None if is_object => Frame::Report,
            None => return Err(ReduceError::RootNotObject),
            Some(Frame::Report) => {
                let key = key.unwrap_or_default();
                match RootKey::from_key(&key) {
                    RootKey::Paths if is_object => {
                        self.ctx.paths_started = true;
                        Frame::Paths
                    }
                    RootKey::Index if is_object => {
                        if self.ctx.paths_started {
                            return Err(ReduceError::IndexAfterPaths);
                        }
                        Frame::Index
                    }
                    RootKey::Paths | RootKey::Index => {
                        return Err(unexpected(&key, "object", found));
                    }
                    RootKey::Other => Frame::Skip,
                    _ => return Err(unexpected(&key, "scalar", found)),
                }
            }
            Some(Frame::Paths) => {
                let path = key.unwrap_or_default();
                if !is_object {
                    return Err(unexpected(&path, "object", found));
                }
                Frame::Path(PathFrame {
                    path,
                    methods: Vec::new(),
                })
            }
            Some(Frame::Path(parent)) => {
                let key = key.unwrap_or_default();
                match key.parse::<HttpMethod>() {
                    Ok(method) if is_object => Frame::Operation(OperationFrame::new(&parent.path, method)),
                    Ok(_) => {
                        return Err(unexpected(&format!("{} {}", parent.path, key), "object", found));
                    }
                    Err(_) => {
                        debug!(path = %parent.path, key, "Ignoring non-method path key");
                        Frame::Skip
                    }
                }
            }
            Some(Frame::Operation(op)) => {
                let key = key.unwrap_or_default();
                match OperationKey::from_key(&key) {
                    OperationKey::HappyPath if is_object => {
                        Frame::Value(ValueFrame::object(Some(Link::Key(key))))
                    }
                    OperationKey::SkipReasonDetails => {
                        let link = Some(Link::Key(key));
                        Frame::Value(if is_object {
                            ValueFrame::object(link)
                        } else {
                            ValueFrame::array(link)
                        })
                    }
                    OperationKey::Issues if !is_object => Frame::Issues(IssuesFrame {
                        path: op.record.path.clone(),
                        method: op.record.method,
                        next_index: 0,
                        status_counts: Default::default(),
                        owasp_issue_count: 0,
                    }),
                    OperationKey::Other => Frame::Skip,
                    OperationKey::HappyPath => return Err(unexpected(&key, "object", found)),
                    OperationKey::Issues => return Err(unexpected(&key, "array", found)),
                    _ => return Err(unexpected(&key, "scalar", found)),
                }
            }
            Some(Frame::Issues(issues)) => {
                let link = Some(Link::Index(issues.next_index));
                Frame::Value(if is_object {
                    ValueFrame::object(link)
                } else {
                    ValueFrame::array(link)
                })
            }
            Some(Frame::Index) => {
                let key = key.unwrap_or_default();
                match IndexTableName::from_key(&key) {
                    Some(name) if !is_object => Frame::IndexTable(IndexTableFrame {
                        name,
                        entries: Vec::new(),
                    }),
                    Some(_) => return Err(unexpected(&key, "array", found)),
                    None => Frame::Skip,
                }
            }
            Some(Frame::IndexTable(table)) => {
                return Err(unexpected(table.name.as_str(), "string", found));
            }
            Some(Frame::Value(parent)) => {
                let link = Some(parent.child_link(key));
                Frame::Value(if is_object {
                    ValueFrame::object(link)
                } else {
                    ValueFrame::array(link)
                })
            }
            Some(Frame::Skip) => Frame::Skip,
        };

        self.stack.push(frame);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ReduceError> {
        let Some(frame) = self.stack.pop() else {
            return Ok(());
        };

        match frame {
            Frame::Report => {
                // A report without metadata keys still gets a row
                if !self.ctx.metadata_flushed {
                    self.ctx.flush_metadata();
                }
            }
            Frame::Paths | Frame::Index | Frame::Skip => {}
            Frame::Path(path) => {
                self.ctx.outbox.push_back(Flush::Path(PathRecord {
                    path: path.path,
                    methods: path.methods,
                }));
            }
            Frame::Operation(op) => {
                if let Some(Frame::Path(parent)) = self.stack.last_mut() {
                    parent.methods.push(op.record.method);
                }
                self.ctx.outbox.push_back(Flush::Operation(op.record));
            }
            Frame::Issues(issues) => {
                if let Some(Frame::Operation(op)) = self.stack.last_mut() {
                    op.record.status_counts.add(&issues.status_counts);
                    op.record.owasp_issue_count += issues.owasp_issue_count;
                }
            }
            Frame::IndexTable(table) => {
                debug!(table = %table.name, entries = table.entries.len(), "Index table complete");
                self.ctx.tables.insert(table.name, table.entries.clone());
                self.ctx.outbox.push_back(Flush::IndexTable {
                    name: table.name,
                    entries: table.entries,
                });
            }
            Frame::Value(frame) => {
                let link = frame.link.clone();
                let value = frame.into_value();
                match self.stack.last_mut() {
                    Some(Frame::Value(parent)) => {
                        let link = link.unwrap_or_else(|| parent.child_link(None));
                        parent.insert(link, value);
                    }
                    Some(Frame::Issues(issues)) => self.ctx.issue(issues, value)?,
                    Some(Frame::Operation(op)) => {
                        if let Some(Link::Key(key)) = link {
                            match OperationKey::from_key(&key) {
                                OperationKey::HappyPath => self.ctx.happy_path(op, value)?,
                                OperationKey::SkipReasonDetails => {
                                    op.record.skip_reason_details = Some(value);
                                }
                                _ => {}
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

impl JsonEventSink for ReportReducer {
    fn on_event(&mut self, event: JsonEvent) {
        if self.error.is_some() {
            return;
        }

        let result = match event {
            JsonEvent::Key(key) => {
                self.key = Some(key);
                Ok(())
            }
            JsonEvent::OpenObject => self.open(true),
            JsonEvent::OpenArray => self.open(false),
            JsonEvent::CloseObject | JsonEvent::CloseArray => self.close(),
            JsonEvent::Value(scalar) => self.value(scalar),
            JsonEvent::End => {
                self.finished = true;
                Ok(())
            }
            // Reported to the caller by the tokenizer itself
            JsonEvent::Error(_) => Ok(()),
        };

        if let Err(e) = result {
            self.error = Some(e);
        }
    }

    fn wants_pause(&self) -> bool {
        self.error.is_some() || self.ctx.outbox.len() >= self.max_pending
    }
}

fn operation_value(op: &mut OperationFrame, key: &str, scalar: Scalar) -> Result<(), ReduceError> {
    if scalar == Scalar::Null {
        return Ok(());
    }
    let record = &mut op.record;
    let context = format!("{} {} {}", record.method, record.path, key);

    match OperationKey::from_key(key) {
        OperationKey::Checked => record.checked = expect_bool(&context, scalar)?,
        OperationKey::Reason => record.skip_reason = Some(expect_string(&context, scalar)?),
        OperationKey::TotalRequest => record.total_request = expect_u64(&context, scalar)?,
        OperationKey::TotalExpected => record.total_expected = expect_u64(&context, scalar)?,
        OperationKey::TotalUnexpected => record.total_unexpected = expect_u64(&context, scalar)?,
        OperationKey::TotalFailure => record.total_failure = expect_u64(&context, scalar)?,
        OperationKey::SkipReasonDetails => record.skip_reason_details = Some(scalar.into()),
        OperationKey::HappyPath => {
            return Err(unexpected(&context, "object", scalar_kind(&scalar)));
        }
        OperationKey::Issues => {
            return Err(unexpected(&context, "array", scalar_kind(&scalar)));
        }
        OperationKey::Other => {}
    }
    Ok(())
}

fn scalar_kind(scalar: &Scalar) -> &'static str {
    match scalar {
        Scalar::String(_) => "string",
        Scalar::Number(_) => "number",
        Scalar::Bool(_) => "boolean",
        Scalar::Null => "null",
    }
}

fn unexpected(context: &str, expected: &'static str, found: &'static str) -> ReduceError {
    ReduceError::UnexpectedType {
        context: context.to_string(),
        expected,
        found,
    }
}

fn expect_string(context: &str, scalar: Scalar) -> Result<String, ReduceError> {
    match scalar {
        Scalar::String(s) => Ok(s),
        other => Err(unexpected(context, "string", scalar_kind(&other))),
    }
}

fn expect_bool(context: &str, scalar: Scalar) -> Result<bool, ReduceError> {
    match scalar {
        Scalar::Bool(b) => Ok(b),
        other => Err(unexpected(context, "boolean", scalar_kind(&other))),
    }
}

fn expect_u64(context: &str, scalar: Scalar) -> Result<u64, ReduceError> {
    match scalar {
        Scalar::Number(n) if n >= 0.0 && n.fract() == 0.0 && n <= u64::MAX as f64 => Ok(n as u64),
        Scalar::Number(n) => Err(ReduceError::InvalidNumber {
            context: context.to_string(),
            value: n,
        }),
        other => Err(unexpected(context, "number", scalar_kind(&other))),
    }
}

fn expect_i64(context: &str, scalar: Scalar) -> Result<i64, ReduceError> {
    match scalar {
        Scalar::Number(n) if n.fract() == 0.0 && n >= i64::MIN as f64 && n <= i64::MAX as f64 => {
            Ok(n as i64)
        }
        Scalar::Number(n) => Err(ReduceError::InvalidNumber {
            context: context.to_string(),
            value: n,
        }),
        other => Err(unexpected(context, "number", scalar_kind(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IntegralStatus;
    use crate::infrastructure::parser::Tokenizer;

    fn reduce(text: &str, policy: IssueErrorPolicy) -> (Vec<Flush>, ReportReducer) {
        let mut tokenizer = Tokenizer::new();
        let mut reducer = ReportReducer::new(policy);
        tokenizer.write(text, &mut reducer).unwrap();
        tokenizer.close(&mut reducer).unwrap();
        let flushes = reducer.drain().collect();
        (flushes, reducer)
    }

    const REPORT: &str = r#"{
        "taskId": "task-1",
        "scanVersion": "1.8.2-beta",
        "scanReportVersion": "2.1.0",
        "errorsOnly": false,
        "state": "finished",
        "exitCode": 0,
        "totalRequest": 3,
        "issues": 1,
        "startDate": "2024-01-02T03:04:05Z",
        "index": {
            "injectionKeys": ["sql-injection"],
            "responseKeys": ["unexpected"],
            "responseDescriptions": ["Unexpected error"]
        },
        "paths": {
            "/pets": {
                "get": {
                    "checked": true,
                    "totalRequest": 3,
                    "totalExpected": 2,
                    "totalUnexpected": 1,
                    "totalFailure": 0,
                    "happyPath": {"apiResponseAnalysis": [{"responseKey": "http-status-expected"}]},
                    "issues": [
                        {"id": "i1", "injectionKey": 0, "owasp": 8,
                         "apiResponseAnalysis": [{"responseKey": 0, "responseDescription": 0}]}
                    ]
                },
                "parameters": []
            }
        }
    }"#;

    #[test]
    fn test_flush_order_and_records() {
        let (flushes, reducer) = reduce(REPORT, IssueErrorPolicy::Abort);
        assert!(reducer.is_finished());
        assert!(reducer.error().is_none());

        let kinds: Vec<&str> = flushes
            .iter()
            .map(|f| match f {
                Flush::IndexTable { .. } => "table",
                Flush::Issue(_) => "issue",
                Flush::SkippedIssue => "skipped",
                Flush::Operation(_) => "operation",
                Flush::Path(_) => "path",
                Flush::Metadata(_) => "metadata",
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["metadata", "table", "table", "table", "issue", "operation", "path"]
        );

        let Flush::Issue(issue) = &flushes[4] else {
            panic!("expected issue");
        };
        assert_eq!(issue.injection_key.as_deref(), Some("sql-injection"));
        assert_eq!(issue.integral_status, IntegralStatus::UnexpectedConformitySuccess);
        assert_eq!(issue.owasp.id(), "API8:2019");

        let Flush::Operation(op) = &flushes[5] else {
            panic!("expected operation");
        };
        assert!(op.checked);
        assert_eq!(op.total_request, 3);
        assert_eq!(op.total_unexpected, 1);
        assert_eq!(op.issue_count(), 1);
        assert_eq!(op.owasp_issue_count, 1);
        assert!(op.happy_path.as_ref().is_some_and(|h| h.success));

        let Flush::Path(path) = &flushes[6] else {
            panic!("expected path");
        };
        assert_eq!(path.methods, vec![HttpMethod::Get]);

        let Flush::Metadata(metadata) = &flushes[0] else {
            panic!("expected metadata");
        };
        assert_eq!(metadata.task_id.as_deref(), Some("task-1"));
        assert_eq!(metadata.scan_version, Some(Version::new(1, 8, 2)));
        assert_eq!(metadata.scan_report_version, Some(Version::new(2, 1, 0)));
        assert_eq!(metadata.issue_count, Some(1));
        assert_eq!(metadata.exit_code, Some(0));
    }

    #[test]
    fn test_metadata_queued_before_root_closes() {
        let mut tokenizer = Tokenizer::new();
        let mut reducer = ReportReducer::new(IssueErrorPolicy::Abort);
        tokenizer
            .write(r#"{"taskId": "t-1", "paths": {"/a": {}}, "errorsOnly": true"#, &mut reducer)
            .unwrap();

        let metadata: Vec<ScanMetadata> = reducer
            .drain()
            .filter_map(|f| match f {
                Flush::Metadata(m) => Some(m),
                _ => None,
            })
            .collect();
        assert_eq!(metadata.len(), 2);
        assert_eq!(metadata[0].task_id.as_deref(), Some("t-1"));
        assert!(!metadata[0].errors_only);
        assert!(metadata[1].errors_only);

        tokenizer.write("}", &mut reducer).unwrap();
        tokenizer.close(&mut reducer).unwrap();
        assert!(reducer.is_finished());
        assert_eq!(reducer.drain().count(), 0);
    }

    #[test]
    fn test_empty_report_still_flushes_metadata() {
        let (flushes, _) = reduce("{}", IssueErrorPolicy::Abort);
        assert_eq!(flushes, vec![Flush::Metadata(ScanMetadata::default())]);
    }

    #[test]
    fn test_pending_records_capped_while_tokenizing() {
        let issues: Vec<String> = (0..500)
            .map(|i| format!(r#"{{"id": "i{}", "criticality": 1}}"#, i))
            .collect();
        let text = format!(
            r#"{{"paths": {{"/a": {{"get": {{"issues": [{}]}}}}}}}}"#,
            issues.join(",")
        );

        let mut tokenizer = Tokenizer::new();
        let mut reducer = ReportReducer::new(IssueErrorPolicy::Abort).with_max_pending(1);
        let mut rest = text.as_str();
        let mut ids = Vec::new();
        while !rest.is_empty() {
            let consumed = tokenizer.write_partial(rest, &mut reducer).unwrap();
            assert!(reducer.pending() <= 1);
            for flush in reducer.drain() {
                if let Flush::Issue(issue) = flush {
                    ids.push(issue.id);
                }
            }
            rest = &rest[consumed..];
        }
        tokenizer.close(&mut reducer).unwrap();

        assert_eq!(ids.len(), 500);
        assert_eq!(ids[0], "i0");
        assert_eq!(ids[499], "i499");
    }

    #[test]
    fn test_index_after_paths_is_error() {
        let text = r#"{"paths": {}, "index": {"injectionKeys": []}}"#;
        let mut tokenizer = Tokenizer::new();
        let mut reducer = ReportReducer::new(IssueErrorPolicy::Abort);
        tokenizer.write(text, &mut reducer).unwrap();
        assert_eq!(reducer.error(), Some(&ReduceError::IndexAfterPaths));
    }

    #[test]
    fn test_invalid_report_version_is_error() {
        let text = r#"{"scanReportVersion": "two"}"#;
        let mut tokenizer = Tokenizer::new();
        let mut reducer = ReportReducer::new(IssueErrorPolicy::Abort);
        tokenizer.write(text, &mut reducer).unwrap();
        assert!(matches!(reducer.error(), Some(ReduceError::ReportVersion(_))));
    }

    #[test]
    fn test_type_mismatch_is_error() {
        let text = r#"{"paths": {"/a": {"get": {"totalRequest": "three"}}}}"#;
        let mut tokenizer = Tokenizer::new();
        let mut reducer = ReportReducer::new(IssueErrorPolicy::Abort);
        tokenizer.write(text, &mut reducer).unwrap();
        assert!(matches!(
            reducer.error(),
            Some(ReduceError::UnexpectedType { expected: "number", found: "string", .. })
        ));
    }

    #[test]
    fn test_skip_policy_counts_bad_issue() {
        let text = r#"{"paths": {"/a": {"post": {"issues": [
            {"id": "ok", "criticality": 2},
            {"criticality": 2},
            {"id": "bad-index", "injectionKey": 4}
        ]}}}}"#;
        let (flushes, reducer) = reduce(text, IssueErrorPolicy::Skip);
        assert!(reducer.error().is_none());
        let skipped = flushes.iter().filter(|f| **f == Flush::SkippedIssue).count();
        let stored = flushes.iter().filter(|f| matches!(f, Flush::Issue(_))).count();
        assert_eq!((stored, skipped), (1, 2));
    }

    #[test]
    fn test_abort_policy_reports_issue_position() {
        let text = r#"{"paths": {"/a": {"post": {"issues": [{"id": "ok"}, {"id": "x", "owasp": 12}]}}}}"#;
        let mut tokenizer = Tokenizer::new();
        let mut reducer = ReportReducer::new(IssueErrorPolicy::Abort);
        tokenizer.write(text, &mut reducer).unwrap();
        match reducer.error() {
            Some(ReduceError::Issue { path, method, index, .. }) => {
                assert_eq!(path, "/a");
                assert_eq!(*method, HttpMethod::Post);
                assert_eq!(*index, 1);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_unknown_sections_are_skipped() {
        let text = r#"{"extra": {"nested": [1, 2, {"paths": {}}]}, "paths": {"/a": {"connect": {"issues": [{}]}, "delete": {}}}}"#;
        let (flushes, reducer) = reduce(text, IssueErrorPolicy::Abort);
        assert!(reducer.error().is_none());
        let ops: Vec<&OperationRecord> = flushes
            .iter()
            .filter_map(|f| match f {
                Flush::Operation(op) => Some(op),
                _ => None,
            })
            .collect();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].method, HttpMethod::Delete);
        assert_eq!(ops[0].happy_path, None);
    }

    #[test]
    fn test_skip_reason_details_rebuilt() {
        let text = r#"{"paths": {"/a": {"get": {"checked": false, "reason": "no schema",
            "skipReasonDetails": {"codes": [1, 2], "detail": {"k": "v"}}}}}}"#;
        let (flushes, _) = reduce(text, IssueErrorPolicy::Abort);
        let op = flushes
            .iter()
            .find_map(|f| match f {
                Flush::Operation(op) => Some(op),
                _ => None,
            })
            .unwrap();
        assert_eq!(op.skip_reason.as_deref(), Some("no schema"));
        assert_eq!(
            op.skip_reason_details,
            Some(serde_json::json!({"codes": [1, 2], "detail": {"k": "v"}}))
        );
        assert_eq!(op.status_counts.total(), 0);
    }
}
