//! Wire representation of issue and happy path entries
//!
//! Fields that the report may deduplicate into an index table are typed as
//! [`IndexedText`]: either a table position or the literal string.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// A table position or a literal string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum IndexedText {
    Index(u64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponseAnalysis {
    pub response_key: IndexedText,
    pub response_description: Option<IndexedText>,
    #[serde(default)]
    pub response_description_params: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequest {
    pub url: Option<String>,
    pub method: Option<String>,
    pub content_type: Option<IndexedText>,
    pub body_length: Option<u64>,
    pub timestamp: Option<Value>,
    pub curl: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawResponse {
    pub http_status_code: Option<u16>,
    pub content_type: Option<IndexedText>,
    pub body_length: Option<u64>,
    pub timestamp: Option<Value>,
    pub duration: Option<f64>,
}

/// One entry of an operation's `issues` array
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawIssue {
    pub id: String,
    pub injection_key: Option<IndexedText>,
    pub injection_description: Option<IndexedText>,
    #[serde(default)]
    pub injection_description_params: Vec<Value>,
    #[serde(default)]
    pub api_response_analysis: Vec<RawResponseAnalysis>,
    pub criticality: Option<u64>,
    /// Legacy single value, 2019 edition
    pub owasp: Option<u64>,
    /// Edition year to category number
    pub owasp_mapping: Option<BTreeMap<String, u64>>,
    pub json_pointer: Option<IndexedText>,
    pub request: Option<RawRequest>,
    pub response: Option<RawResponse>,
}

/// An operation's `happyPath` object
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawHappyPath {
    pub success: Option<bool>,
    #[serde(default)]
    pub api_response_analysis: Vec<RawResponseAnalysis>,
    pub json_pointer: Option<IndexedText>,
    pub request: Option<RawRequest>,
    pub response: Option<RawResponse>,
}

/// Render a scalar parameter or timestamp as text
pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
