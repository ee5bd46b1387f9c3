//! Validate command - surface data quality issues without writing a report

use crate::cmd::{read_events, resolve_tax_year};
use crate::core::{calculate_gains, GainsError, GainsOptions, TaxYear, Warning};
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ValidateCommand {
    /// CSV or JSON file containing normalized transactions ("-" for stdin)
    file: PathBuf,

    /// Tax year used to date assumed zero-cost lots (defaults to last year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Output as JSON instead of formatted text
    #[arg(long)]
    json: bool,
}

/// A validation issue for output
#[derive(Debug, Clone, Serialize)]
struct ValidationIssue {
    #[serde(rename = "type")]
    issue_type: String,
    message: String,
}

impl From<&Warning> for ValidationIssue {
    fn from(warning: &Warning) -> Self {
        ValidationIssue {
            issue_type: warning.kind().to_string(),
            message: warning.message(),
        }
    }
}

impl From<&GainsError> for ValidationIssue {
    fn from(err: &GainsError) -> Self {
        let issue_type = match err {
            GainsError::Ledger(_) => "LedgerShortfall",
            GainsError::Reconcile(_) => "TaxYearOutOfRange",
        };
        ValidationIssue {
            issue_type: issue_type.to_string(),
            message: err.to_string(),
        }
    }
}

/// JSON output structure
#[derive(Debug, Serialize)]
struct ValidationOutput {
    tax_year: String,
    issue_count: usize,
    issues: Vec<ValidationIssue>,
}

impl ValidateCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let tax_year = resolve_tax_year(self.year);
        let events = read_events(&self.file)?;

        let issues: Vec<ValidationIssue> =
            match calculate_gains(events, GainsOptions { tax_year, aggregate: false }) {
                Ok(report) => report.warnings.iter().map(ValidationIssue::from).collect(),
                // Errors stop the report, list them instead of failing
                Err(err) => vec![ValidationIssue::from(&err)],
            };

        if self.json {
            self.print_json(&issues, tax_year)?;
        } else {
            self.print_text(&issues, tax_year);
        }

        // Exit with code 1 if issues found
        if !issues.is_empty() {
            std::process::exit(1);
        }
        Ok(())
    }

    fn print_text(&self, issues: &[ValidationIssue], year: TaxYear) {
        println!();
        println!("VALIDATION RESULTS ({})", year);
        println!();

        if issues.is_empty() {
            println!("\u{2713} No issues found.");
        } else {
            println!("\u{26A0} {} issue(s) found:", issues.len());
            println!();

            for (i, issue) in issues.iter().enumerate() {
                println!("  {}. [{}] {}", i + 1, issue.issue_type, issue.message);
            }
            println!();
        }
    }

    fn print_json(&self, issues: &[ValidationIssue], year: TaxYear) -> anyhow::Result<()> {
        let output = ValidationOutput {
            tax_year: year.display(),
            issue_count: issues.len(),
            issues: issues.to_vec(),
        };

        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}
