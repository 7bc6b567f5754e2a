//! Issue queries over a populated store
//!
//! The path filter is pushed down to the store as an [`IssueScope`]. The
//! remaining layers run in order, each one short-circuiting:
//! 1. free-text search
//! 2. path and method
//! 3. status classification
//! 4. OWASP category set
//! 5. severity set
//!
//! An unset layer matches every issue.

use std::collections::HashSet;
use std::sync::Arc;

use scanlens_core::config::QueryConfig;
use serde::Serialize;
use tracing::{debug, instrument};

use super::errors::QueryError;
use crate::domain::{HttpMethod, IntegralStatus, Issue, OwaspCategory, Severity};
use crate::infrastructure::store::{IssueScope, ReportStore};

/// Hierarchical path filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathFilter {
    pub path: String,
    pub method: Option<HttpMethod>,
    /// Match paths below `path` as well as `path` itself
    pub include_sub_paths: bool,
}

impl PathFilter {
    pub fn strict(path: impl Into<String>, method: Option<HttpMethod>) -> Self {
        Self {
            path: path.into(),
            method,
            include_sub_paths: false,
        }
    }

    pub fn sub_paths(path: impl Into<String>, method: Option<HttpMethod>) -> Self {
        Self {
            path: path.into(),
            method,
            include_sub_paths: true,
        }
    }

    /// Narrowest store scan covering this filter
    pub fn scope(&self) -> IssueScope {
        match (self.include_sub_paths, self.method) {
            (true, _) => IssueScope::PathPrefix(self.path.clone()),
            (false, Some(method)) => IssueScope::Operation {
                path: self.path.clone(),
                method,
            },
            (false, None) => IssueScope::Path(self.path.clone()),
        }
    }

    pub fn matches(&self, issue: &Issue) -> bool {
        let path_ok = if self.include_sub_paths {
            IssueScope::PathPrefix(self.path.clone()).contains(&issue.path, issue.method)
        } else {
            issue.path == self.path
        };
        path_ok && self.method.is_none_or(|m| m == issue.method)
    }
}

/// Status classification filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusFilter {
    Integral(IntegralStatus),
    /// Any issue mapped to an OWASP category
    HasOwaspIssue,
}

impl StatusFilter {
    pub fn matches(&self, issue: &Issue) -> bool {
        match self {
            StatusFilter::Integral(status) => issue.integral_status == *status,
            StatusFilter::HasOwaspIssue => issue.has_owasp_issue(),
        }
    }
}

/// Structured filter layers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub path: Option<PathFilter>,
    pub status: Option<StatusFilter>,
    pub owasp: HashSet<OwaspCategory>,
    pub severities: HashSet<Severity>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Order of the issues in the report
    #[default]
    Document,
    CriticalityDesc,
    CriticalityAsc,
    PathAsc,
    PathDesc,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueQuery {
    /// Zero-based page
    pub page: usize,
    /// `None` uses the configured default
    pub per_page: Option<usize>,
    pub sort: SortOrder,
    pub search: Option<String>,
    pub filter: IssueFilter,
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuePage {
    pub items: Vec<Issue>,
    pub page: usize,
    pub per_page: usize,
    /// Issues in the store
    pub total_items: u64,
    /// Issues passing every filter layer
    pub filtered_items: u64,
    /// `ceil(total_items / per_page)`
    pub total_pages: u64,
}

/// Case-insensitive free-text match over the displayed issue fields
pub fn matches_text(issue: &Issue, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    let hit = |text: &str| text.to_lowercase().contains(&needle);

    hit(issue.method.as_str())
        || hit(&issue.path)
        || (issue.has_owasp_issue() && hit(&issue.owasp.id()))
        || hit(issue.integral_status.as_str())
        || issue.injection_key.as_deref().is_some_and(hit)
        || issue.response_analysis.iter().any(|r| {
            hit(&r.response_key) || r.response_description.as_deref().is_some_and(hit)
        })
        || hit(issue.conformance_label())
        || hit(issue.severity.as_str())
        || hit(&issue.criticality.to_string())
}

/// Read-only issue queries
pub struct QueryService {
    store: Arc<dyn ReportStore>,
    config: QueryConfig,
}

impl QueryService {
    pub fn new(store: Arc<dyn ReportStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    #[instrument(skip(self, query), fields(page = query.page))]
    pub async fn get_issues(&self, query: &IssueQuery) -> Result<IssuePage, QueryError> {
        let per_page = query.per_page.unwrap_or(self.config.default_per_page);
        if per_page == 0 || per_page > self.config.max_per_page {
            return Err(QueryError::InvalidPageSize {
                per_page,
                max: self.config.max_per_page,
            });
        }

        let total_items = self.store.count_issues().await?;
        let scope = query
            .filter
            .path
            .as_ref()
            .map(PathFilter::scope)
            .unwrap_or(IssueScope::All);
        let candidates = self.store.scan_issues(&scope).await?;

        let mut matched: Vec<Issue> = candidates
            .into_iter()
            .filter(|issue| passes(issue, query))
            .collect();
        sort_issues(&mut matched, query.sort);

        let filtered_items = matched.len() as u64;
        let total_pages = total_items.div_ceil(per_page as u64);
        let items: Vec<Issue> = matched
            .into_iter()
            .skip(query.page.saturating_mul(per_page))
            .take(per_page)
            .collect();

        debug!(
            total_items,
            filtered_items,
            returned = items.len(),
            "Issue query complete"
        );

        Ok(IssuePage {
            items,
            page: query.page,
            per_page,
            total_items,
            filtered_items,
            total_pages,
        })
    }
}

fn passes(issue: &Issue, query: &IssueQuery) -> bool {
    let filter = &query.filter;
    query
        .search
        .as_deref()
        .is_none_or(|needle| matches_text(issue, needle))
        && filter.path.as_ref().is_none_or(|p| p.matches(issue))
        && filter.status.is_none_or(|s| s.matches(issue))
        && (filter.owasp.is_empty() || filter.owasp.contains(&issue.owasp))
        && (filter.severities.is_empty() || filter.severities.contains(&issue.severity))
}

/// Stable sort, so ties keep document order
fn sort_issues(issues: &mut [Issue], order: SortOrder) {
    match order {
        SortOrder::Document => {}
        SortOrder::CriticalityDesc => issues.sort_by(|a, b| b.criticality.cmp(&a.criticality)),
        SortOrder::CriticalityAsc => issues.sort_by_key(|i| i.criticality),
        SortOrder::PathAsc => {
            issues.sort_by(|a, b| (&a.path, a.method).cmp(&(&b.path, b.method)))
        }
        SortOrder::PathDesc => {
            issues.sort_by(|a, b| (&b.path, b.method).cmp(&(&a.path, a.method)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OwaspEdition, ResponseAnalysis, ResponseClassification};

    fn issue(path: &str, method: HttpMethod, criticality: u8) -> Issue {
        let classification = ResponseClassification::Expected;
        Issue {
            id: format!("{}-{}", method, path),
            path: path.to_string(),
            method,
            injection_key: Some("sql-injection".into()),
            injection_description: None,
            response_analysis: vec![ResponseAnalysis {
                response_key: "http-status-expected".into(),
                response_description: Some("Status as documented".into()),
            }],
            criticality,
            severity: Severity::from_criticality(criticality).unwrap_or(Severity::Info),
            owasp: OwaspCategory::None,
            json_pointer: None,
            request: None,
            response: None,
            classification,
            is_contract_conforming: true,
            integral_status: IntegralStatus::derive(true, classification),
        }
    }

    #[test]
    fn test_text_search_fields() {
        let i = issue("/pets/{id}", HttpMethod::Delete, 5);
        assert!(matches_text(&i, "DELETE"));
        assert!(matches_text(&i, "pets/{"));
        assert!(matches_text(&i, "documented"));
        assert!(matches_text(&i, "critical"));
        assert!(matches_text(&i, "expected-conformity"));
        assert!(matches_text(&i, "   "));
        assert!(!matches_text(&i, "API8"));
    }

    #[test]
    fn test_text_search_skips_unmapped_owasp() {
        let mut i = issue("/pets", HttpMethod::Get, 2);
        assert!(!matches_text(&i, "none"));

        i.owasp = OwaspCategory::Api {
            edition: OwaspEdition::Y2019,
            number: 8,
        };
        assert!(matches_text(&i, "api8:2019"));
        assert!(!matches_text(&i, "none"));
    }

    #[test]
    fn test_path_filter_scope() {
        assert_eq!(
            PathFilter::strict("/pets", Some(HttpMethod::Get)).scope(),
            IssueScope::Operation {
                path: "/pets".into(),
                method: HttpMethod::Get
            }
        );
        assert_eq!(
            PathFilter::strict("/pets", None).scope(),
            IssueScope::Path("/pets".into())
        );
        assert_eq!(
            PathFilter::sub_paths("/pets", Some(HttpMethod::Get)).scope(),
            IssueScope::PathPrefix("/pets".into())
        );
    }

    #[test]
    fn test_sub_path_filter_checks_method() {
        let filter = PathFilter::sub_paths("/pets", Some(HttpMethod::Get));
        assert!(filter.matches(&issue("/pets/{id}", HttpMethod::Get, 1)));
        assert!(!filter.matches(&issue("/pets/{id}", HttpMethod::Put, 1)));
        assert!(!filter.matches(&issue("/petshop", HttpMethod::Get, 1)));
    }

    #[test]
    fn test_sort_is_stable() {
        let mut issues = vec![
            issue("/b", HttpMethod::Get, 2),
            issue("/a", HttpMethod::Get, 4),
            issue("/c", HttpMethod::Get, 2),
        ];
        sort_issues(&mut issues, SortOrder::CriticalityDesc);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["/a", "/b", "/c"]);

        sort_issues(&mut issues, SortOrder::PathDesc);
        let paths: Vec<&str> = issues.iter().map(|i| i.path.as_str()).collect();
        assert_eq!(paths, vec!["/c", "/b", "/a"]);
    }
}
