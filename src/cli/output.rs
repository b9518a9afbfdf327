//! Output formatting for CLI commands.
//!
//! This module provides formatting utilities for displaying
//! information to the user in various formats.

use colored::Colorize;
use std::fmt::Write;
use tabled::{Table, Tabled};

use crate::config::{TagSyncConfig, ValidationResult};
use crate::reconciler::{ReconciliationReport, ResourceOutcome};
use crate::tags::TagSet;

use super::commands::OutputFormat;

/// Output formatter for CLI.
#[derive(Debug)]
pub struct OutputFormatter {
    /// Output format.
    format: OutputFormat,
}

/// Resource change row for table display.
#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Resource")]
    resource: String,
    #[tabled(rename = "Add/Update")]
    upserted: String,
    #[tabled(rename = "Remove")]
    deleted: String,
}

impl OutputFormatter {
    /// Creates a new output formatter.
    #[must_use]
    pub const fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a reconciliation report for display.
    #[must_use]
    pub fn format_report(&self, report: &ReconciliationReport) -> String {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(report).unwrap_or_default(),
            OutputFormat::Text => Self::format_report_text(report),
        }
    }

    /// Formats a report as text.
    fn format_report_text(report: &ReconciliationReport) -> String {
        let mut output = String::new();
        let mode = if report.dry_run { "Plan" } else { "Apply" };

        let _ = writeln!(output, "\n{mode}: cluster {}", report.cluster.bold());
        let _ = writeln!(output, "   Run id: {}\n", report.run_id);

        if report.is_converged() {
            let _ = writeln!(
                output,
                "{} No changes required - all {} resources are tagged.",
                "✓".green(),
                report.resources.len()
            );
            return output;
        }

        let rows: Vec<ResourceRow> = report
            .resources
            .iter()
            .filter(|r| !r.is_converged())
            .map(Self::resource_row)
            .collect();

        output.push_str(&Table::new(rows).to_string());
        output.push('\n');

        let verb = if report.dry_run { "to change" } else { "changed" };
        let _ = write!(
            output,
            "\n{}: {} {verb}, {} unchanged\n",
            mode,
            report.changed_count().to_string().yellow(),
            report.unchanged_count().to_string().green()
        );

        if report.dry_run {
            let _ = writeln!(
                output,
                "\n{} No tags were modified. Run 'eks-tags apply' to apply these changes.",
                "⚠".yellow()
            );
        }

        output
    }

    /// Builds a table row for a changed resource.
    fn resource_row(outcome: &ResourceOutcome) -> ResourceRow {
        ResourceRow {
            kind: outcome.kind.to_string(),
            resource: outcome.id.clone(),
            upserted: Self::format_tags(&outcome.upserted).green().to_string(),
            deleted: outcome
                .deleted
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join("\n")
                .red()
                .to_string(),
        }
    }

    /// Formats tags as one `key=value` per line.
    fn format_tags(tags: &TagSet) -> String {
        tags.iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats the result of validating a configuration.
    #[must_use]
    pub fn format_validation(
        &self,
        config: &TagSyncConfig,
        result: &ValidationResult,
        show_warnings: bool,
    ) -> String {
        match self.format {
            OutputFormat::Json => {
                let json = serde_json::json!({
                    "valid": result.is_valid(),
                    "cluster": config.cluster.name,
                    "region": config.cluster.region,
                    "additional_tags": config.additional_tags,
                    "nodegroups": config.nodegroups,
                    "fargate_profiles": config.fargate_profiles,
                    "warnings": result.warnings,
                });
                serde_json::to_string_pretty(&json).unwrap_or_default()
            }
            OutputFormat::Text => {
                let mut output = format!("{} Configuration is valid!\n", "✓".green());

                if show_warnings && !result.warnings.is_empty() {
                    let _ = write!(output, "\n{} Warnings:\n", "⚠".yellow());
                    for warning in &result.warnings {
                        let _ = writeln!(output, "   - {warning}");
                    }
                }

                let _ = writeln!(output, "\nConfiguration summary:");
                let _ = writeln!(output, "   Cluster: {}", config.cluster.name);
                let _ = writeln!(
                    output,
                    "   Region: {}",
                    config.cluster.region.as_deref().unwrap_or("(default)")
                );
                let _ = writeln!(output, "   Additional tags: {}", config.additional_tags.len());
                let _ = writeln!(
                    output,
                    "   Nodegroups: {}",
                    Self::format_selection(config.nodegroups.as_deref())
                );
                let _ = writeln!(
                    output,
                    "   Fargate profiles: {}",
                    Self::format_selection(config.fargate_profiles.as_deref())
                );

                output
            }
        }
    }

    /// Describes a configured name list.
    fn format_selection(names: Option<&[String]>) -> String {
        match names {
            None => String::from("all (discovered)"),
            Some([]) => String::from("none"),
            Some(names) => names.join(", "),
        }
    }
}
