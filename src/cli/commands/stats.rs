//! Stats Command - aggregate counters of the stored report

use anyhow::Result;
use clap::Args;
use scanlens_report::ReportStats;

use crate::cli::context::CliContext;
use crate::cli::exit_codes;
use crate::cli::output::OutputFormat;

/// Arguments for the stats command
#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Show one row per operation instead of per path
    #[arg(long)]
    pub operations: bool,
}

/// Run the stats command
pub async fn run(ctx: &CliContext, args: &StatsArgs) -> Result<i32> {
    let stats = ctx.app.stats_service().compute().await?;

    match ctx.output.format() {
        OutputFormat::Json => ctx.output.json(&stats)?,
        OutputFormat::Table => print_table(ctx, &stats, args.operations),
    }
    Ok(exit_codes::SUCCESS)
}

fn print_table(ctx: &CliContext, stats: &ReportStats, per_operation: bool) {
    let mut rows = Vec::new();
    for path in &stats.paths {
        if per_operation {
            for op in &path.operations {
                let t = &op.totals;
                rows.push(vec![
                    format!("{} {}", op.method.as_str().to_uppercase(), path.path),
                    t.requests.to_string(),
                    t.expected.to_string(),
                    t.unexpected.to_string(),
                    t.failure.to_string(),
                    t.status_counts.total().to_string(),
                    t.owasp_issue_count.to_string(),
                    op.skip_reason.clone().unwrap_or_default(),
                ]);
            }
        } else {
            let t = &path.totals;
            rows.push(vec![
                path.path.clone(),
                t.requests.to_string(),
                t.expected.to_string(),
                t.unexpected.to_string(),
                t.failure.to_string(),
                t.status_counts.total().to_string(),
                t.owasp_issue_count.to_string(),
                format!("{} skipped", t.skipped_operations),
            ]);
        }
    }

    let first = if per_operation { "OPERATION" } else { "PATH" };
    ctx.output.table(
        &[first, "REQUESTS", "EXPECTED", "UNEXPECTED", "FAILURE", "ISSUES", "OWASP", "NOTE"],
        &rows,
    );

    let t = &stats.totals;
    ctx.output.print(&format!(
        "Total tested: {}  (requests {}, issues {}, owasp {})",
        stats.total_tested_count,
        t.requests,
        t.status_counts.total(),
        t.owasp_issue_count
    ));
    ctx.output.print(&format!(
        "Operations: {} checked, {} skipped; happy path {} ok, {} failed",
        t.checked_operations, t.skipped_operations, t.happy_path_success, t.happy_path_failure
    ));
    if stats.errors_only {
        ctx.output
            .info("Errors-only report: totals are summed from issue statuses");
    }
}
