//! Report value objects

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::errors::DomainError;

/// HTTP method of an operation
///
/// Variants are declared alphabetically so that the derived ordering matches
/// the lexical ordering used by the SQL backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Delete,
    Get,
    Head,
    Options,
    Patch,
    Post,
    Put,
    Trace,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 8] = [
        HttpMethod::Delete,
        HttpMethod::Get,
        HttpMethod::Head,
        HttpMethod::Options,
        HttpMethod::Patch,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Trace,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Delete => "delete",
            HttpMethod::Get => "get",
            HttpMethod::Head => "head",
            HttpMethod::Options => "options",
            HttpMethod::Patch => "patch",
            HttpMethod::Post => "post",
            HttpMethod::Put => "put",
            HttpMethod::Trace => "trace",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str() == lower)
            .ok_or_else(|| DomainError::UnknownHttpMethod(s.to_string()))
    }
}

/// Outcome class of a response analysis, from the suffix of its response key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseClassification {
    Expected,
    Unexpected,
    Successful,
}

impl ResponseClassification {
    /// Classify a hyphen-separated response key such as `http-status-expected`.
    /// Unrecognised keys are treated as unexpected.
    pub fn from_response_key(key: &str) -> Self {
        match key.rsplit('-').next().unwrap_or_default() {
            "expected" => ResponseClassification::Expected,
            "successful" => ResponseClassification::Successful,
            _ => ResponseClassification::Unexpected,
        }
    }
}

/// Six-way classification combining contract conformance and the injection outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegralStatus {
    ExpectedConformitySuccess,
    UnexpectedConformitySuccess,
    SuccessfulConformitySuccess,
    ExpectedConformityFailure,
    UnexpectedConformityFailure,
    SuccessfulConformityFailure,
}

impl IntegralStatus {
    pub const ALL: [IntegralStatus; 6] = [
        IntegralStatus::ExpectedConformitySuccess,
        IntegralStatus::UnexpectedConformitySuccess,
        IntegralStatus::SuccessfulConformitySuccess,
        IntegralStatus::ExpectedConformityFailure,
        IntegralStatus::UnexpectedConformityFailure,
        IntegralStatus::SuccessfulConformityFailure,
    ];

    pub fn derive(is_contract_conforming: bool, classification: ResponseClassification) -> Self {
        use ResponseClassification::*;
        match (is_contract_conforming, classification) {
            (true, Expected) => IntegralStatus::ExpectedConformitySuccess,
            (true, Unexpected) => IntegralStatus::UnexpectedConformitySuccess,
            (true, Successful) => IntegralStatus::SuccessfulConformitySuccess,
            (false, Expected) => IntegralStatus::ExpectedConformityFailure,
            (false, Unexpected) => IntegralStatus::UnexpectedConformityFailure,
            (false, Successful) => IntegralStatus::SuccessfulConformityFailure,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegralStatus::ExpectedConformitySuccess => "expected-conformity-success",
            IntegralStatus::UnexpectedConformitySuccess => "unexpected-conformity-success",
            IntegralStatus::SuccessfulConformitySuccess => "successful-conformity-success",
            IntegralStatus::ExpectedConformityFailure => "expected-conformity-failure",
            IntegralStatus::UnexpectedConformityFailure => "unexpected-conformity-failure",
            IntegralStatus::SuccessfulConformityFailure => "successful-conformity-failure",
        }
    }
}

impl fmt::Display for IntegralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IntegralStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IntegralStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::UnknownIntegralStatus(s.to_string()))
    }
}

/// Issue severity, derived from criticality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Map a 0-5 criticality score
    pub fn from_criticality(criticality: u8) -> Option<Self> {
        match criticality {
            0 | 1 => Some(Severity::Info),
            2 => Some(Severity::Low),
            3 => Some(Severity::Medium),
            4 => Some(Severity::High),
            5 => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "info" => Ok(Severity::Info),
            "low" => Ok(Severity::Low),
            "medium" => Ok(Severity::Medium),
            "high" => Ok(Severity::High),
            "critical" => Ok(Severity::Critical),
            _ => Err(DomainError::UnknownSeverity(s.to_string())),
        }
    }
}

/// Edition of the OWASP API Security Top 10
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OwaspEdition {
    Y2019,
    Y2023,
}

impl OwaspEdition {
    pub fn year(&self) -> u16 {
        match self {
            OwaspEdition::Y2019 => 2019,
            OwaspEdition::Y2023 => 2023,
        }
    }

    pub fn from_year(year: u16) -> Option<Self> {
        match year {
            2019 => Some(OwaspEdition::Y2019),
            2023 => Some(OwaspEdition::Y2023),
            _ => None,
        }
    }
}

const OWASP_2019: [&str; 10] = [
    "Broken Object Level Authorization",
    "Broken User Authentication",
    "Excessive Data Exposure",
    "Lack of Resources & Rate Limiting",
    "Broken Function Level Authorization",
    "Mass Assignment",
    "Security Misconfiguration",
    "Injection",
    "Improper Assets Management",
    "Insufficient Logging & Monitoring",
];

const OWASP_2023: [&str; 10] = [
    "Broken Object Level Authorization",
    "Broken Authentication",
    "Broken Object Property Level Authorization",
    "Unrestricted Resource Consumption",
    "Broken Function Level Authorization",
    "Unrestricted Access to Sensitive Business Flows",
    "Server Side Request Forgery",
    "Security Misconfiguration",
    "Improper Inventory Management",
    "Unsafe Consumption of APIs",
];

/// OWASP API Security Top 10 category, or the explicit `None` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OwaspCategory {
    None,
    Api { edition: OwaspEdition, number: u8 },
}

impl OwaspCategory {
    /// Look up a category; `0` is the `None` entry, `1..=10` the Top 10.
    pub fn lookup(edition: OwaspEdition, number: u64) -> Result<Self, DomainError> {
        match number {
            0 => Ok(OwaspCategory::None),
            1..=10 => Ok(OwaspCategory::Api {
                edition,
                number: number as u8,
            }),
            _ => Err(DomainError::OwaspOutOfRange {
                year: edition.year(),
                value: number,
            }),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, OwaspCategory::None)
    }

    /// Full identifier, e.g. `API8:2019`
    pub fn id(&self) -> String {
        match self {
            OwaspCategory::None => "None".to_string(),
            OwaspCategory::Api { edition, number } => format!("API{}:{}", number, edition.year()),
        }
    }

    /// Short name, e.g. `API8`
    pub fn short_name(&self) -> String {
        match self {
            OwaspCategory::None => "None".to_string(),
            OwaspCategory::Api { number, .. } => format!("API{}", number),
        }
    }

    pub fn year(&self) -> Option<u16> {
        match self {
            OwaspCategory::None => None,
            OwaspCategory::Api { edition, .. } => Some(edition.year()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            OwaspCategory::None => "None",
            OwaspCategory::Api { edition, number } => {
                let table = match edition {
                    OwaspEdition::Y2019 => &OWASP_2019,
                    OwaspEdition::Y2023 => &OWASP_2023,
                };
                table[(*number as usize).saturating_sub(1).min(9)]
            }
        }
    }
}

impl fmt::Display for OwaspCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id())
    }
}

impl FromStr for OwaspCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::UnknownOwaspCategory(s.to_string());
        if s.eq_ignore_ascii_case("none") {
            return Ok(OwaspCategory::None);
        }
        let (short, year) = s.split_once(':').ok_or_else(invalid)?;
        let number = short
            .strip_prefix("API")
            .or_else(|| short.strip_prefix("api"))
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(invalid)?;
        let edition = year
            .parse::<u16>()
            .ok()
            .and_then(OwaspEdition::from_year)
            .ok_or_else(invalid)?;
        OwaspCategory::lookup(edition, number)
    }
}

impl Serialize for OwaspCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for OwaspCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Name of an index side table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IndexTableName {
    JsonPointers,
    ContentTypes,
    InjectionKeys,
    InjectionDescriptions,
    ResponseKeys,
    ResponseDescriptions,
}

impl IndexTableName {
    pub const ALL: [IndexTableName; 6] = [
        IndexTableName::JsonPointers,
        IndexTableName::ContentTypes,
        IndexTableName::InjectionKeys,
        IndexTableName::InjectionDescriptions,
        IndexTableName::ResponseKeys,
        IndexTableName::ResponseDescriptions,
    ];

    /// Key of the table inside the report's `index` section
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexTableName::JsonPointers => "jsonPointers",
            IndexTableName::ContentTypes => "contentTypes",
            IndexTableName::InjectionKeys => "injectionKeys",
            IndexTableName::InjectionDescriptions => "injectionDescriptions",
            IndexTableName::ResponseKeys => "responseKeys",
            IndexTableName::ResponseDescriptions => "responseDescriptions",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        IndexTableName::ALL.into_iter().find(|t| t.as_str() == key)
    }
}

impl fmt::Display for IndexTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
