use super::aggregate::{aggregate, sort_records, GainRecord};
use super::classify::Term;
use super::events::{EventLog, Side, TransactionEvent};
use super::ledger::{LedgerError, LotLedger};
use super::matching::{replay, DisposalMatch};
use super::reconcile::{reconcile_shortfalls, ReconcileError, ShortfallInjection};
use super::tax_year::TaxYear;
use super::warnings::Warning;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum GainsError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
}

#[derive(Debug, Clone, Copy)]
pub struct GainsOptions {
    pub tax_year: TaxYear,
    /// Collapse matches sharing asset, disposal date and acquisition date
    pub aggregate: bool,
}

/// Running sums for the target tax year
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Totals {
    pub disposal_count: usize,
    pub total_proceeds: Decimal,
    pub total_cost_basis: Decimal,
    pub total_gain: Decimal,
    /// Gain/loss on short-term holdings only
    pub taxed_gain: Decimal,
    pub total_fees: Decimal,
}

#[derive(Debug)]
pub struct GainsReport {
    pub tax_year: TaxYear,
    /// Sorted output rows for the tax year
    pub records: Vec<GainRecord>,
    /// Matches disposed in the tax year, in replay order
    pub matches: Vec<DisposalMatch>,
    pub totals: Totals,
    pub injections: Vec<ShortfallInjection>,
    pub warnings: Vec<Warning>,
    /// Lots still open after replaying the whole history
    pub ledger: LotLedger,
}

/// Run the full pipeline: reconcile, replay, filter by tax year, aggregate.
///
/// Reconciliation and replay always cover the whole history so that lots
/// bought or sold in other years are consumed correctly.
pub fn calculate_gains(log: EventLog, options: GainsOptions) -> Result<GainsReport, GainsError> {
    let EventLog {
        events,
        mut warnings,
    } = log;
    let tax_year = options.tax_year;
    let mut ledger = LotLedger::new();

    let injections = reconcile_shortfalls(&events, tax_year, &mut ledger)?;
    warnings.extend(injections.iter().map(|i| Warning::ShortfallInjected {
        asset: i.asset.clone(),
        quantity: i.quantity,
        date: i.date,
    }));

    let matches: Vec<DisposalMatch> = replay(&events, &mut ledger)?
        .into_iter()
        .filter(|m| tax_year.contains(m.disposal_date()))
        .collect();

    let mut records = if options.aggregate {
        aggregate(&matches)
    } else {
        matches.iter().map(GainRecord::from).collect()
    };
    sort_records(&mut records);

    let totals = compute_totals(&events, &matches, tax_year);
    log::info!(
        "Tax year {}: {} disposals, {} matches, {} records, gain {}",
        tax_year,
        totals.disposal_count,
        matches.len(),
        records.len(),
        totals.total_gain.round_dp(2)
    );

    Ok(GainsReport {
        tax_year,
        records,
        matches,
        totals,
        injections,
        warnings,
        ledger,
    })
}

fn compute_totals(events: &[TransactionEvent], matches: &[DisposalMatch], tax_year: TaxYear) -> Totals {
    let mut totals = Totals::default();

    for m in matches {
        totals.total_proceeds += m.proceeds;
        totals.total_cost_basis += m.cost_basis;
        totals.total_gain += m.gain_loss;
        if m.term == Term::Short {
            totals.taxed_gain += m.gain_loss;
        }
    }

    for event in events.iter().filter(|e| tax_year.contains(e.date())) {
        match event.side {
            Side::Dispose => totals.disposal_count += 1,
            Side::Fee => totals.total_fees += event.counter_value,
            Side::Acquire => {}
        }
        totals.total_fees += event.fee.unwrap_or(Decimal::ZERO);
    }

    totals
}
