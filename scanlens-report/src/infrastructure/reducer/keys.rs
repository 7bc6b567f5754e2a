//! Recognised report and operation keys

/// Keys of the report's root object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKey {
    TaskId,
    ScanVersion,
    ScanReportVersion,
    ErrorsOnly,
    State,
    ExitCode,
    TotalRequest,
    Issues,
    StartDate,
    Paths,
    Index,
    Other,
}

impl RootKey {
    pub fn from_key(key: &str) -> Self {
        match key {
            "taskId" => RootKey::TaskId,
            "scanVersion" => RootKey::ScanVersion,
            "scanReportVersion" => RootKey::ScanReportVersion,
            "errorsOnly" => RootKey::ErrorsOnly,
            "state" => RootKey::State,
            "exitCode" => RootKey::ExitCode,
            "totalRequest" => RootKey::TotalRequest,
            "issues" => RootKey::Issues,
            "startDate" => RootKey::StartDate,
            "paths" => RootKey::Paths,
            "index" => RootKey::Index,
            _ => RootKey::Other,
        }
    }
}

/// Keys of an operation object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKey {
    Checked,
    Reason,
    TotalRequest,
    TotalExpected,
    TotalUnexpected,
    TotalFailure,
    SkipReasonDetails,
    HappyPath,
    Issues,
    Other,
}

impl OperationKey {
    pub fn from_key(key: &str) -> Self {
        match key {
            "checked" => OperationKey::Checked,
            "reason" => OperationKey::Reason,
            "totalRequest" => OperationKey::TotalRequest,
            "totalExpected" => OperationKey::TotalExpected,
            "totalUnexpected" => OperationKey::TotalUnexpected,
            "totalFailure" => OperationKey::TotalFailure,
            "skipReasonDetails" => OperationKey::SkipReasonDetails,
            "happyPath" => OperationKey::HappyPath,
            "issues" => OperationKey::Issues,
            _ => OperationKey::Other,
        }
    }
}
