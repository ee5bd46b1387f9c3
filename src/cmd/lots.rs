//! Lots command - open FIFO lots left after replaying the whole history

use crate::cmd::{read_events, resolve_tax_year};
use crate::core::output::fixed;
use crate::core::{calculate_gains, GainsOptions, Lot, LotLedger};
use clap::Args;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::PathBuf;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

#[derive(Args, Debug)]
pub struct LotsCommand {
    /// Events file (CSV or JSON). Reads CSV from stdin if not specified.
    #[arg(default_value = "-")]
    file: PathBuf,

    /// Tax year used to date assumed zero-cost lots (defaults to last year)
    #[arg(short, long)]
    year: Option<i32>,

    /// Filter by asset (e.g., BTC, ETH)
    #[arg(short, long)]
    asset: Option<String>,

    /// Output as JSON instead of formatted table
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct AssetLots<'a> {
    asset: &'a str,
    quantity: Decimal,
    cost_basis: Decimal,
    lots: Vec<&'a Lot>,
}

#[derive(Debug, Clone, Tabled)]
struct LotRow {
    #[tabled(rename = "Asset")]
    asset: String,
    #[tabled(rename = "Acquired")]
    acquired: String,
    #[tabled(rename = "Quantity")]
    quantity: String,
    #[tabled(rename = "Cost (EUR)")]
    cost_basis: String,
    #[tabled(rename = "Unit Price")]
    unit_price: String,
    #[tabled(rename = "Venue")]
    venue: String,
    #[tabled(rename = "Assumed")]
    synthetic: String,
}

impl LotsCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        let events = read_events(&self.file)?;
        let report = calculate_gains(
            events,
            GainsOptions {
                tax_year: resolve_tax_year(self.year),
                aggregate: false,
            },
        )?;
        let holdings = self.collect(&report.ledger);

        if self.json {
            println!("{}", serde_json::to_string_pretty(&holdings)?);
        } else {
            self.print_table(&holdings);
        }
        Ok(())
    }

    fn collect<'a>(&self, ledger: &'a LotLedger) -> Vec<AssetLots<'a>> {
        ledger
            .assets()
            .into_iter()
            .filter(|asset| {
                self.asset
                    .as_deref()
                    .is_none_or(|a| asset.eq_ignore_ascii_case(a))
            })
            .map(|asset| {
                let lots: Vec<&Lot> = ledger.lots(asset).collect();
                AssetLots {
                    asset,
                    quantity: lots.iter().map(|l| l.quantity).sum(),
                    cost_basis: lots.iter().map(|l| l.cost_basis).sum(),
                    lots,
                }
            })
            .collect()
    }

    fn print_table(&self, holdings: &[AssetLots]) {
        if holdings.is_empty() {
            println!("No open lots found matching filters");
            return;
        }

        let rows: Vec<LotRow> = holdings
            .iter()
            .flat_map(|h| {
                h.lots.iter().map(move |lot| LotRow {
                    asset: h.asset.to_string(),
                    acquired: lot.acquired_at.format("%d.%m.%Y %H:%M").to_string(),
                    quantity: format_quantity(lot.quantity),
                    cost_basis: fixed(lot.cost_basis, 2),
                    unit_price: fixed(lot.unit_price, 2),
                    venue: lot.venue.clone().unwrap_or_default(),
                    synthetic: if lot.synthetic { "yes" } else { "" }.to_string(),
                })
            })
            .collect();

        println!();
        println!("OPEN LOTS");
        println!();

        let table = Table::new(rows)
            .with(Style::rounded())
            .with(Modify::new(Rows::new(1..)).with(Alignment::right()))
            .to_string();
        println!("{}", table);
        println!();

        for h in holdings {
            println!(
                "  {}: {} held, cost basis {} EUR",
                h.asset,
                format_quantity(h.quantity),
                fixed(h.cost_basis, 2)
            );
        }
    }
}

fn format_quantity(qty: Decimal) -> String {
    let s = fixed(qty, 8);
    let trimmed = s.trim_end_matches('0').trim_end_matches('.');
    trimmed.to_string()
}
