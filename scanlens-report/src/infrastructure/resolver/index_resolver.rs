//! Maps raw issue and happy path entries into domain records

use scanlens_core::domain::{Precision, Version};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::description::substitute;
use super::owasp::resolve_owasp;
use super::wire::{
    IndexedText, RawHappyPath, RawIssue, RawRequest, RawResponse, RawResponseAnalysis, scalar_text,
};
use super::ResolveError;
use crate::domain::{
    HappyPathDetails, HttpMethod, IndexTableName, IndexTables, IntegralStatus, Issue,
    RequestDetails, ResponseAnalysis, ResponseClassification, ResponseDetails, Severity,
};

/// First report version whose keys are hyphen separated
pub const HYPHENATED_KEYS_SINCE: Version = Version::new(2, 0, 0);

/// Key spelling used by a report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyFormat {
    /// `http.status.expected`, normalised on read
    Dotted,
    /// `http-status-expected`
    Hyphenated,
}

impl KeyFormat {
    /// A report without a schema version follows the current rules.
    pub fn for_report(report_version: Option<&Version>) -> Self {
        match report_version {
            Some(v) if !v.at_least(&HYPHENATED_KEYS_SINCE, Precision::MajorMinor) => {
                KeyFormat::Dotted
            }
            _ => KeyFormat::Hyphenated,
        }
    }

    fn normalize(&self, key: String) -> String {
        match self {
            KeyFormat::Dotted => key.replace('.', "-"),
            KeyFormat::Hyphenated => key,
        }
    }
}

/// Resolves indexed fields against a report's tables
#[derive(Debug, Clone, Copy)]
pub struct IndexResolver<'a> {
    tables: &'a IndexTables,
    key_format: KeyFormat,
}

impl<'a> IndexResolver<'a> {
    pub fn new(tables: &'a IndexTables, report_version: Option<&Version>) -> Self {
        Self {
            tables,
            key_format: KeyFormat::for_report(report_version),
        }
    }

    pub fn key_format(&self) -> KeyFormat {
        self.key_format
    }

    /// Resolve one `issues[]` entry of the operation `(path, method)`.
    pub fn resolve_issue(
        &self,
        path: &str,
        method: HttpMethod,
        raw: Value,
    ) -> Result<Issue, ResolveError> {
        let raw: RawIssue = decode(raw, "issue")?;

        let injection_key = raw
            .injection_key
            .as_ref()
            .map(|t| self.text(IndexTableName::InjectionKeys, t))
            .transpose()?
            .map(|k| self.key_format.normalize(k));
        let injection_params: Vec<String> =
            raw.injection_description_params.iter().map(scalar_text).collect();
        let injection_description = raw
            .injection_description
            .as_ref()
            .map(|t| self.text(IndexTableName::InjectionDescriptions, t))
            .transpose()?
            .map(|template| substitute(&template, &injection_params));

        let response_analysis = self.response_analysis(&raw.api_response_analysis)?;
        let (classification, is_contract_conforming) = classify(&response_analysis);

        let criticality = raw.criticality.unwrap_or(0);
        let severity = u8::try_from(criticality)
            .ok()
            .and_then(Severity::from_criticality)
            .ok_or(ResolveError::InvalidCriticality(criticality))?;

        let owasp = resolve_owasp(raw.owasp, raw.owasp_mapping.as_ref())?;

        Ok(Issue {
            id: raw.id,
            path: path.to_string(),
            method,
            injection_key,
            injection_description,
            response_analysis,
            criticality: criticality as u8,
            severity,
            owasp,
            json_pointer: self.json_pointer(raw.json_pointer.as_ref())?,
            request: raw.request.as_ref().map(|r| self.request(r)).transpose()?,
            response: raw.response.as_ref().map(|r| self.response(r)).transpose()?,
            classification,
            is_contract_conforming,
            integral_status: IntegralStatus::derive(is_contract_conforming, classification),
        })
    }

    /// Resolve an operation's `happyPath` object.
    ///
    /// Without an explicit `success` flag the happy path succeeded when its
    /// single response analysis was expected.
    pub fn resolve_happy_path(&self, raw: Value) -> Result<HappyPathDetails, ResolveError> {
        let raw: RawHappyPath = decode(raw, "happy path")?;

        let response_analysis = self.response_analysis(&raw.api_response_analysis)?;
        let (classification, is_contract_conforming) = classify(&response_analysis);
        let success = raw.success.unwrap_or(
            is_contract_conforming && classification == ResponseClassification::Expected,
        );

        Ok(HappyPathDetails {
            success,
            response_analysis,
            json_pointer: self.json_pointer(raw.json_pointer.as_ref())?,
            request: raw.request.as_ref().map(|r| self.request(r)).transpose()?,
            response: raw.response.as_ref().map(|r| self.response(r)).transpose()?,
            classification,
            is_contract_conforming,
        })
    }

    fn text(&self, table: IndexTableName, value: &IndexedText) -> Result<String, ResolveError> {
        match value {
            IndexedText::Text(text) => Ok(text.clone()),
            IndexedText::Index(index) => Ok(self.tables.lookup(table, *index)?.to_string()),
        }
    }

    fn json_pointer(&self, value: Option<&IndexedText>) -> Result<Option<String>, ResolveError> {
        value
            .map(|t| self.text(IndexTableName::JsonPointers, t))
            .transpose()
    }

    fn content_type(&self, value: Option<&IndexedText>) -> Result<Option<String>, ResolveError> {
        value
            .map(|t| self.text(IndexTableName::ContentTypes, t))
            .transpose()
    }

    fn response_analysis(
        &self,
        entries: &[RawResponseAnalysis],
    ) -> Result<Vec<ResponseAnalysis>, ResolveError> {
        entries
            .iter()
            .map(|entry| {
                let response_key = self
                    .key_format
                    .normalize(self.text(IndexTableName::ResponseKeys, &entry.response_key)?);
                let params: Vec<String> = entry
                    .response_description_params
                    .iter()
                    .map(scalar_text)
                    .collect();
                let response_description = entry
                    .response_description
                    .as_ref()
                    .map(|t| self.text(IndexTableName::ResponseDescriptions, t))
                    .transpose()?
                    .map(|template| substitute(&template, &params));
                Ok(ResponseAnalysis {
                    response_key,
                    response_description,
                })
            })
            .collect()
    }

    fn request(&self, raw: &RawRequest) -> Result<RequestDetails, ResolveError> {
        Ok(RequestDetails {
            url: raw.url.clone(),
            method: raw.method.clone(),
            content_type: self.content_type(raw.content_type.as_ref())?,
            body_length: raw.body_length,
            timestamp: raw.timestamp.as_ref().map(scalar_text),
            curl: raw.curl.clone(),
        })
    }

    fn response(&self, raw: &RawResponse) -> Result<ResponseDetails, ResolveError> {
        Ok(ResponseDetails {
            http_status_code: raw.http_status_code,
            content_type: self.content_type(raw.content_type.as_ref())?,
            body_length: raw.body_length,
            timestamp: raw.timestamp.as_ref().map(scalar_text),
            duration: raw.duration,
        })
    }
}

/// Classification comes from the first analysis entry; a response conforms
/// to the contract when exactly one entry was recorded.
fn classify(entries: &[ResponseAnalysis]) -> (ResponseClassification, bool) {
    let classification = entries
        .first()
        .map(|e| ResponseClassification::from_response_key(&e.response_key))
        .unwrap_or(ResponseClassification::Unexpected);
    (classification, entries.len() == 1)
}

fn decode<T: DeserializeOwned>(raw: Value, what: &'static str) -> Result<T, ResolveError> {
    serde_json::from_value(raw).map_err(|e| ResolveError::Malformed {
        what,
        message: e.to_string(),
    })
}
