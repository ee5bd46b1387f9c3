use super::classify::{gain_loss, Term};
use super::events::{Side, TransactionEvent};
use super::ledger::{LedgerError, LotLedger};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

/// One disposal matched against one consumed lot fragment
#[derive(Debug, Clone, PartialEq)]
pub struct DisposalMatch {
    pub asset: String,
    pub quantity: Decimal,
    pub acquired_at: NaiveDateTime,
    pub disposed_at: NaiveDateTime,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub gain_loss: Decimal,
    pub term: Term,
    pub acquisition_venue: Option<String>,
    pub disposal_venue: Option<String>,
    /// Drawn from a lot assumed by shortfall reconciliation
    pub synthetic: bool,
}

impl DisposalMatch {
    pub fn acquisition_date(&self) -> NaiveDate {
        self.acquired_at.date()
    }

    pub fn disposal_date(&self) -> NaiveDate {
        self.disposed_at.date()
    }
}

/// Replay events in timestamp order against the ledger.
///
/// The sort is stable, so events sharing a timestamp keep their input
/// order. Fee events are skipped; they never affect lots.
pub fn replay(
    events: &[TransactionEvent],
    ledger: &mut LotLedger,
) -> Result<Vec<DisposalMatch>, LedgerError> {
    let mut ordered: Vec<&TransactionEvent> = events.iter().collect();
    ordered.sort_by_key(|e| e.datetime);

    let mut matches = Vec::new();
    for event in ordered {
        match event.side {
            Side::Acquire => ledger.add(
                &event.asset,
                event.quantity,
                event.datetime,
                event.counter_value,
                event.venue.clone(),
            ),
            Side::Dispose => {
                let fragments = ledger.remove(&event.asset, event.quantity)?;
                let count = fragments.len();
                let mut allocated = Decimal::ZERO;

                for (i, fragment) in fragments.into_iter().enumerate() {
                    // Pro-rata share of the sale value; the last fragment takes
                    // the rest so shares sum to the counter value exactly
                    let proceeds = if i + 1 == count {
                        event.counter_value - allocated
                    } else {
                        event.counter_value * fragment.quantity / event.quantity
                    };
                    allocated += proceeds;

                    matches.push(DisposalMatch {
                        asset: event.asset.clone(),
                        quantity: fragment.quantity,
                        acquired_at: fragment.acquired_at,
                        disposed_at: event.datetime,
                        proceeds,
                        cost_basis: fragment.cost_basis,
                        gain_loss: gain_loss(proceeds, fragment.cost_basis),
                        term: Term::classify(fragment.acquired_at.date(), event.date()),
                        acquisition_venue: fragment.venue,
                        disposal_venue: event.venue.clone(),
                        synthetic: fragment.synthetic,
                    });
                }
            }
            Side::Fee => {}
        }
    }

    Ok(matches)
}
