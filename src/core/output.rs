use super::aggregate::GainRecord;
use super::gains::Totals;
use super::tax_year::TaxYear;
use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use std::io::Write;

pub const BASE_CURRENCY: &str = "EUR";

const COLUMNS: &[&str] = &[
    "Amount",
    "Currency",
    "Date Sold",
    "Date Acquired",
    "Short/Long",
    "Buy/Input at",
    "Sell/Output at",
    "Proceeds",
    "Cost Basis",
    "Gain/Loss",
];

/// Round half away from zero, then pad to exactly `dp` decimals
pub fn fixed(amount: Decimal, dp: u32) -> String {
    let rounded = amount.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", dp as usize, rounded)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Write the gains table: identifier row, column names, one row per record.
///
/// Fields are never quoted. `default_venue` fills in records whose lot or
/// disposal carried no venue.
pub fn write_gains_csv<W: Write>(
    writer: W,
    records: &[GainRecord],
    tax_year: TaxYear,
    default_venue: &str,
) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .from_writer(writer);

    wtr.write_record([
        "Identifier:Capital_Gains".to_string(),
        "Method:FIFO".to_string(),
        format!("Tax_Year:{}", tax_year),
        format!("Base_Currency:{}", BASE_CURRENCY),
    ])?;
    wtr.write_record(COLUMNS)?;

    for record in records {
        wtr.write_record([
            fixed(record.quantity, 8),
            record.asset.clone(),
            format_date(record.disposal_date),
            format_date(record.acquisition_date),
            record.term.to_string(),
            record
                .acquisition_venue
                .clone()
                .unwrap_or_else(|| default_venue.to_string()),
            record
                .disposal_venue
                .clone()
                .unwrap_or_else(|| default_venue.to_string()),
            fixed(record.proceeds, 3),
            fixed(record.cost_basis, 3),
            fixed(record.gain_loss, 3),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn format_eur(amount: Decimal) -> String {
    format!("{} {}", fixed(amount, 2), BASE_CURRENCY)
}

/// Plain-text summary of the year's totals
pub fn summary_text(totals: &Totals, tax_year: TaxYear) -> String {
    let outcome = if totals.taxed_gain > Decimal::ZERO {
        "gain"
    } else {
        "loss"
    };
    format!(
        "--> In {} a total of {} was realized.\n    Of this, {} is taxable as short-term {}.\n    The sum of all fees is {}.\n",
        tax_year,
        format_eur(totals.total_gain),
        format_eur(totals.taxed_gain),
        outcome,
        format_eur(totals.total_fees)
    )
}
