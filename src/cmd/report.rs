//! Report command - FIFO gains table and yearly summary

use crate::cmd::{read_events, resolve_tax_year};
use crate::core::output::{summary_text, write_gains_csv};
use crate::core::{calculate_gains, GainRecord, GainsOptions, GainsReport, Totals, Warning};
use clap::Args;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct ReportCommand {
    /// CSV or JSON file containing normalized transactions ("-" for stdin)
    file: PathBuf,

    /// Tax year to report (defaults to last year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Write the gains table to this file and the summary next to it
    /// (.txt, or .summary.txt when the table itself is a .txt file)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// One row per consumed lot instead of grouping by asset and dates
    #[arg(short = 'n', long)]
    no_aggregate: bool,

    /// Venue shown for transactions that carry none
    #[arg(long, default_value = "Unknown")]
    venue: String,

    /// Output records and totals as JSON instead of the gains table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct ReportJson<'a> {
    tax_year: i32,
    aggregated: bool,
    /// Lot fragments matched in the year, before grouping
    match_count: usize,
    /// Matched fragments that drew on an assumed zero-cost lot
    assumed_count: usize,
    totals: &'a Totals,
    records: &'a [GainRecord],
    warnings: &'a [Warning],
}

impl ReportCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let tax_year = resolve_tax_year(self.year);
        let events = read_events(&self.file)?;
        let report = calculate_gains(
            events,
            GainsOptions {
                tax_year,
                aggregate: !self.no_aggregate,
            },
        )?;

        if self.json {
            return self.print_json(&report);
        }

        for injection in &report.injections {
            eprintln!(
                "Note: assumed purchase of {} {} on {} at 0 EUR to cover missing history",
                injection.quantity,
                injection.asset,
                injection.date.format("%d.%m.%Y")
            );
        }

        let summary = summary_text(&report.totals, report.tax_year);
        match &self.output {
            Some(path) => {
                let file = File::create(path)?;
                write_gains_csv(BufWriter::new(file), &report.records, tax_year, &self.venue)?;
                let summary_file = summary_path(path);
                fs::write(&summary_file, &summary)?;
                log::info!(
                    "Wrote {} records to {} and summary to {}",
                    report.records.len(),
                    path.display(),
                    summary_file.display()
                );
                print!("{}", summary);
            }
            None => {
                write_gains_csv(io::stdout().lock(), &report.records, tax_year, &self.venue)?;
                eprint!("{}", summary);
            }
        }
        Ok(())
    }

    fn print_json(&self, report: &GainsReport) -> anyhow::Result<()> {
        let output = ReportJson {
            tax_year: report.tax_year.0,
            aggregated: !self.no_aggregate,
            match_count: report.matches.len(),
            assumed_count: report.matches.iter().filter(|m| m.synthetic).count(),
            totals: &report.totals,
            records: &report.records,
            warnings: &report.warnings,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }
}

/// Summary file next to the gains table, never the table itself
fn summary_path(table: &Path) -> PathBuf {
    let is_txt = table
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("txt"));
    if is_txt {
        table.with_extension("summary.txt")
    } else {
        table.with_extension("txt")
    }
}
