//! Terminal output helpers

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;

/// Output format for command results
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Aligned columns for humans (default)
    #[default]
    Table,
    /// JSON for machine processing
    Json,
}

/// Writes results to stdout and status messages to stderr
#[derive(Debug, Clone)]
pub struct OutputWriter {
    format: OutputFormat,
    quiet: bool,
}

impl OutputWriter {
    pub fn new(format: OutputFormat, quiet: bool) -> Self {
        Self { format, quiet }
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    fn chatty(&self) -> bool {
        !self.quiet && self.format == OutputFormat::Table
    }

    pub fn header(&self, title: &str) {
        if self.chatty() {
            eprintln!("{}", title.bold().underline());
        }
    }

    pub fn info(&self, message: &str) {
        if self.chatty() {
            eprintln!("{} {}", "info:".cyan(), message);
        }
    }

    pub fn success(&self, message: &str) {
        if self.chatty() {
            eprintln!("{} {}", "ok:".green().bold(), message);
        }
    }

    pub fn warn(&self, message: &str) {
        if !self.quiet {
            eprintln!("{} {}", "warning:".yellow().bold(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", "error:".red().bold(), message);
    }

    /// Result line on stdout
    pub fn print(&self, line: &str) {
        println!("{}", line);
    }

    pub fn json<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Print rows as left-aligned columns sized to their widest cell
    pub fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        let mut widths: Vec<usize> = headers.iter().map(|h| h.len()).collect();
        for row in rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(cell.chars().count());
            }
        }

        let render = |cells: Vec<String>| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let header = render(headers.iter().map(|h| h.to_string()).collect());
        println!("{}", header.bold());
        for row in rows {
            println!("{}", render(row.clone()));
        }
    }
}
