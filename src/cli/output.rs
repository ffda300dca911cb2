//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{ImportPlan, ValidationResult};
use crate::pipeline::{ImportOutcome, RunReport};

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Candidate row for table display.
#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Step")]
    step: usize,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Target")]
    target: String,
    #[tabled(rename = "ID / Reason")]
    detail: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a run report for display.
    #[must_use]
    pub fn format_report(&self, report: &RunReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    /// Formats a report as text.
    fn format_report_text(report: &RunReport) -> String {
        let mut output = String::new();

        let _ = writeln!(
            output,
            "\nImport run {}{}",
            report.run_id,
            if report.dry_run { " (dry run)" } else { "" }
        );
        if let Some(path) = &report.backup_path {
            let _ = writeln!(output, "   State backup: {}", path.display());
        }
        output.push('\n');

        let rows: Vec<OutcomeRow> = report
            .steps
            .iter()
            .flat_map(|step| {
                let whole_step = step.skipped.as_ref().map(|reason| OutcomeRow {
                    step: step.index,
                    status: "skipped".yellow().to_string(),
                    source: String::from("-"),
                    target: step.import_name.clone(),
                    detail: reason.to_string(),
                });
                whole_step
                    .into_iter()
                    .chain(step.outcomes.iter().map(move |o| Self::outcome_row(step.index, o)))
            })
            .collect();

        if rows.is_empty() {
            output.push_str("   No matching resources found.\n");
        } else {
            output.push_str(&Table::new(rows).to_string());
            output.push('\n');
        }

        let _ = writeln!(output, "\n{report}");
        if let Some(ms) = report.duration_ms() {
            let _ = writeln!(output, "   Duration: {ms} ms");
        }
        output
    }

    /// Builds a table row for one outcome.
    fn outcome_row(step: usize, outcome: &ImportOutcome) -> OutcomeRow {
        match outcome {
            ImportOutcome::Imported {
                source,
                address,
                value,
            } => OutcomeRow {
                step,
                status: "imported".green().to_string(),
                source: source.clone(),
                target: address.clone(),
                detail: value.clone(),
            },
            ImportOutcome::DryRun {
                source,
                address,
                value,
                ..
            } => OutcomeRow {
                step,
                status: "dry-run".cyan().to_string(),
                source: source.clone(),
                target: address.clone(),
                detail: value.clone(),
            },
            ImportOutcome::Skipped { source, reason } => OutcomeRow {
                step,
                status: "skipped".dimmed().to_string(),
                source: source.clone(),
                target: String::from("-"),
                detail: reason.to_string(),
            },
        }
    }

    /// Formats plan validation findings.
    #[must_use]
    pub fn format_validation(
        &self,
        plan: &ImportPlan,
        result: &ValidationResult,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": result.is_valid(),
                    "steps": plan.step_count(),
                    "errors": result.errors.iter().map(ToString::to_string).collect::<Vec<_>>(),
                    "warnings": if show_warnings { result.warnings.clone() } else { Vec::new() },
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = if result.is_valid() {
                    format!(
                        "{} Plan is valid ({} step(s))\n",
                        "✓".green(),
                        plan.step_count()
                    )
                } else {
                    let mut output = format!(
                        "{} Plan has {} error(s):\n",
                        "✗".red(),
                        result.error_count()
                    );
                    for error in &result.errors {
                        let _ = writeln!(output, "   - {error}");
                    }
                    output
                };

                if show_warnings && result.warning_count() > 0 {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                output
            }
        }
    }

    /// Formats an error message.
    #[must_use]
    pub fn format_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({ "status": "error", "message": message });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => format!("{} {message}", "✗".red()),
        }
    }
}
