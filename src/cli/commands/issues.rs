//! Issues Command - filtered, paginated issue listing

use std::collections::HashSet;

use anyhow::Result;
use clap::{Args, ValueEnum};
use scanlens_report::domain::{HttpMethod, IntegralStatus, OwaspCategory, Severity};
use scanlens_report::{
    IssueFilter, IssuePage, IssueQuery, PathFilter, QueryError, SortOrder, StatusFilter,
};

use crate::cli::context::CliContext;
use crate::cli::exit_codes;
use crate::cli::output::OutputFormat;

/// Arguments for the issues command
#[derive(Args, Debug)]
pub struct IssuesArgs {
    /// Only issues of this path template
    #[arg(long)]
    pub path: Option<String>,

    /// Also match paths below --path
    #[arg(long, requires = "path")]
    pub sub_paths: bool,

    /// Only issues of this HTTP method
    #[arg(long)]
    pub method: Option<HttpMethod>,

    /// Integral status (e.g. unexpected-conformity-success) or `owasp`
    #[arg(long, value_parser = parse_status)]
    pub status: Option<StatusFilter>,

    /// OWASP category id such as API8:2019 (repeatable)
    #[arg(long)]
    pub owasp: Vec<OwaspCategory>,

    /// Severity: info, low, medium, high, critical (repeatable)
    #[arg(long)]
    pub severity: Vec<Severity>,

    /// Case-insensitive free-text search
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Zero-based page number
    #[arg(long, default_value_t = 0)]
    pub page: usize,

    /// Issues per page (defaults to the configured value)
    #[arg(long)]
    pub per_page: Option<usize>,

    #[arg(long, value_enum, default_value = "document")]
    pub sort: SortArg,

    /// Exit with status 1 when any issue matches
    #[arg(long)]
    pub fail_on_issues: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortArg {
    Document,
    CriticalityDesc,
    CriticalityAsc,
    PathAsc,
    PathDesc,
}

impl From<SortArg> for SortOrder {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Document => SortOrder::Document,
            SortArg::CriticalityDesc => SortOrder::CriticalityDesc,
            SortArg::CriticalityAsc => SortOrder::CriticalityAsc,
            SortArg::PathAsc => SortOrder::PathAsc,
            SortArg::PathDesc => SortOrder::PathDesc,
        }
    }
}

fn parse_status(raw: &str) -> Result<StatusFilter, String> {
    if raw.eq_ignore_ascii_case("owasp") {
        return Ok(StatusFilter::HasOwaspIssue);
    }
    raw.parse::<IntegralStatus>()
        .map(StatusFilter::Integral)
        .map_err(|e| e.to_string())
}

impl IssuesArgs {
    fn to_query(&self) -> IssueQuery {
        let path = self.path.as_ref().map(|path| PathFilter {
            path: path.clone(),
            method: self.method,
            include_sub_paths: self.sub_paths,
        });
        // A method without a path applies to every path
        let path = path.or_else(|| {
            self.method
                .map(|method| PathFilter::sub_paths("/", Some(method)))
        });

        IssueQuery {
            page: self.page,
            per_page: self.per_page,
            sort: self.sort.into(),
            search: self.search.clone(),
            filter: IssueFilter {
                path,
                status: self.status,
                owasp: self.owasp.iter().copied().collect::<HashSet<_>>(),
                severities: self.severity.iter().copied().collect::<HashSet<_>>(),
            },
        }
    }
}

/// Run the issues command
pub async fn run(ctx: &CliContext, args: &IssuesArgs) -> Result<i32> {
    let query = args.to_query();
    let page = match ctx.app.query_service().get_issues(&query).await {
        Ok(page) => page,
        Err(e @ QueryError::InvalidPageSize { .. }) => {
            ctx.output.error(&e.to_string());
            return Ok(exit_codes::CONFIG_ERROR);
        }
        Err(e) => return Err(e.into()),
    };

    match ctx.output.format() {
        OutputFormat::Json => ctx.output.json(&page)?,
        OutputFormat::Table => print_table(ctx, &page),
    }

    if args.fail_on_issues && page.filtered_items > 0 {
        return Ok(exit_codes::ISSUES_FOUND);
    }
    Ok(exit_codes::SUCCESS)
}

fn print_table(ctx: &CliContext, page: &IssuePage) {
    if page.items.is_empty() {
        ctx.output.success("No matching issues");
    } else {
        let rows: Vec<Vec<String>> = page
            .items
            .iter()
            .map(|issue| {
                vec![
                    issue.id.clone(),
                    issue.method.as_str().to_uppercase(),
                    issue.path.clone(),
                    issue.severity.to_string(),
                    issue.owasp.id(),
                    issue.integral_status.to_string(),
                    issue.injection_key.clone().unwrap_or_default(),
                ]
            })
            .collect();
        ctx.output.table(
            &["ID", "METHOD", "PATH", "SEVERITY", "OWASP", "STATUS", "INJECTION"],
            &rows,
        );
    }
    ctx.output.info(&page_footer(page));
}

/// `total_pages` counts every stored issue, so the pages that actually hold
/// matches are shown next to it.
fn page_footer(page: &IssuePage) -> String {
    let matching_pages = page
        .filtered_items
        .div_ceil(page.per_page.max(1) as u64)
        .max(1);
    format!(
        "Page {} of {} ({} matching on {} {}, {} total)",
        page.page + 1,
        page.total_pages.max(1),
        page.filtered_items,
        matching_pages,
        if matching_pages == 1 { "page" } else { "pages" },
        page.total_items
    )
}
