//! Ingest Command - stream a report file into the store

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};
use scanlens_core::config::IssueErrorPolicy;
use scanlens_report::ingest_reader;

use crate::cli::context::CliContext;
use crate::cli::exit_codes;
use crate::cli::output::OutputFormat;

/// Arguments for the ingest command
#[derive(Args, Debug)]
pub struct IngestArgs {
    /// Report file, or `-` for stdin
    pub file: PathBuf,

    /// What to do with an issue that cannot be resolved
    #[arg(long, value_enum)]
    pub on_bad_issue: Option<PolicyArg>,

    /// Read size in bytes
    #[arg(long)]
    pub chunk_size: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PolicyArg {
    /// Fail the ingestion
    Abort,
    /// Log and skip the issue
    Skip,
}

impl From<PolicyArg> for IssueErrorPolicy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Abort => IssueErrorPolicy::Abort,
            PolicyArg::Skip => IssueErrorPolicy::Skip,
        }
    }
}

/// Run the ingest command
pub async fn run(ctx: &CliContext, args: &IngestArgs) -> Result<i32> {
    let mut config = (*ctx.app.config).clone();
    if let Some(policy) = args.on_bad_issue {
        config.ingestion.issue_error_policy = policy.into();
    }
    if let Some(chunk_size) = args.chunk_size {
        if chunk_size == 0 {
            ctx.output.error("--chunk-size must be greater than zero");
            return Ok(exit_codes::CONFIG_ERROR);
        }
        config.ingestion.chunk_size = chunk_size;
    }

    ctx.output.header("Report ingestion");
    let store = ctx.app.store.clone();
    let result = if args.file.as_os_str() == "-" {
        ctx.output.info("Reading report from stdin");
        ingest_reader(store, &config, tokio::io::stdin()).await
    } else {
        let file = match tokio::fs::File::open(&args.file).await {
            Ok(file) => file,
            Err(e) => {
                ctx.output
                    .error(&format!("Cannot open {:?}: {}", args.file, e));
                return Ok(exit_codes::CONFIG_ERROR);
            }
        };
        ctx.output.info(&format!("Reading {:?}", args.file));
        ingest_reader(store, &config, file).await
    };

    let summary = match result {
        Ok(summary) => summary,
        Err(e) => {
            ctx.output.error(&format!("Ingestion failed: {}", e));
            return Ok(exit_codes::INGEST_ERROR);
        }
    };

    match ctx.output.format() {
        OutputFormat::Json => ctx.output.json(&summary)?,
        OutputFormat::Table => {
            ctx.output.print(&format!("Session:        {}", summary.session_id));
            ctx.output.print(&format!("Bytes read:     {}", summary.bytes));
            ctx.output.print(&format!("Index tables:   {}", summary.index_tables));
            ctx.output.print(&format!("Paths:          {}", summary.paths));
            ctx.output.print(&format!("Operations:     {}", summary.operations));
            ctx.output.print(&format!("Issues stored:  {}", summary.issues));
            if summary.skipped_issues > 0 {
                ctx.output.warn(&format!(
                    "{} malformed issues were skipped",
                    summary.skipped_issues
                ));
            }
            let elapsed = summary.finished_at - summary.started_at;
            ctx.output.success(&format!(
                "Ingested in {} ms",
                elapsed.num_milliseconds()
            ));
        }
    }

    Ok(exit_codes::SUCCESS)
}
