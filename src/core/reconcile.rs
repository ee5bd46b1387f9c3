use super::events::{Side, TransactionEvent};
use super::ledger::LotLedger;
use super::output::fixed;
use super::tax_year::TaxYear;
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("no date available for assumed lots when reporting tax year {0}")]
    SentinelOutOfRange(TaxYear),
}

/// A synthetic zero-cost lot seeded before replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortfallInjection {
    pub asset: String,
    pub quantity: Decimal,
    pub date: NaiveDate,
}

/// Compare acquired and disposed totals per asset over the whole history
/// and seed a zero-cost lot for every asset that was sold more than bought.
///
/// The totals deliberately ignore the tax year: disposals in the reported
/// year can draw on lots from any year.
pub fn reconcile_shortfalls(
    events: &[TransactionEvent],
    tax_year: TaxYear,
    ledger: &mut LotLedger,
) -> Result<Vec<ShortfallInjection>, ReconcileError> {
    let mut totals: BTreeMap<&str, (Decimal, Decimal)> = BTreeMap::new();
    for event in events {
        let (acquired, disposed) = totals.entry(event.asset.as_str()).or_default();
        match event.side {
            Side::Acquire => *acquired += event.quantity,
            Side::Dispose => *disposed += event.quantity,
            Side::Fee => {}
        }
    }

    let shortfalls: Vec<(&str, Decimal)> = totals
        .into_iter()
        .filter(|(_, (acquired, disposed))| disposed > acquired)
        .map(|(asset, (acquired, disposed))| (asset, disposed - acquired))
        .collect();
    if shortfalls.is_empty() {
        return Ok(Vec::new());
    }

    let earliest = events.iter().map(|e| e.date()).min();
    let date = tax_year
        .sentinel_date(earliest)
        .ok_or(ReconcileError::SentinelOutOfRange(tax_year))?;

    let mut injections = Vec::new();
    for (asset, missing) in shortfalls {
        ledger.add_synthetic(asset, missing, date.and_time(NaiveTime::MIN));
        log::warn!(
            "Assumed purchase of {} {} on {} at 0 EUR cost basis to cover historical shortfall",
            fixed(missing, 8),
            asset,
            date.format("%d.%m.%Y")
        );
        injections.push(ShortfallInjection {
            asset: asset.to_string(),
            quantity: missing,
            date,
        });
    }
    Ok(injections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn event(date: &str, side: Side, asset: &str, qty: Decimal) -> TransactionEvent {
        TransactionEvent {
            datetime: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
            side,
            asset: asset.to_string(),
            quantity: qty,
            counter_value: dec!(100),
            fee: None,
            venue: None,
        }
    }

    #[test]
    fn injects_missing_quantity_at_sentinel() {
        let events = vec![
            event("2024-01-10", Side::Acquire, "BTC", dec!(6)),
            event("2024-05-10", Side::Dispose, "BTC", dec!(7)),
            event("2024-06-10", Side::Dispose, "BTC", dec!(3)),
        ];
        let mut ledger = LotLedger::new();

        let injections = reconcile_shortfalls(&events, TaxYear(2024), &mut ledger).unwrap();

        assert_eq!(
            injections,
            vec![ShortfallInjection {
                asset: "BTC".to_string(),
                quantity: dec!(4),
                date: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
            }]
        );
        let lot = ledger.lots("BTC").next().unwrap();
        assert_eq!(lot.quantity, dec!(4));
        assert_eq!(lot.cost_basis, Decimal::ZERO);
        assert!(lot.synthetic);
    }

    #[test]
    fn no_injection_when_covered() {
        let events = vec![
            event("2024-01-10", Side::Acquire, "ETH", dec!(5)),
            event("2024-05-10", Side::Dispose, "ETH", dec!(5)),
            event("2024-05-10", Side::Fee, "ETH", dec!(1)),
        ];
        let mut ledger = LotLedger::new();

        let injections = reconcile_shortfalls(&events, TaxYear(2024), &mut ledger).unwrap();

        assert!(injections.is_empty());
        assert!(ledger.assets().is_empty());
    }

    #[test]
    fn uses_full_history_not_tax_year() {
        // Bought in 2022, sold in 2024: no shortfall even when reporting 2024
        let events = vec![
            event("2022-03-01", Side::Acquire, "BTC", dec!(2)),
            event("2024-03-01", Side::Dispose, "BTC", dec!(2)),
        ];
        let mut ledger = LotLedger::new();

        assert!(reconcile_shortfalls(&events, TaxYear(2024), &mut ledger)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn sentinel_precedes_old_history() {
        let events = vec![
            event("2020-02-01", Side::Dispose, "ADA", dec!(10)),
            event("2024-02-01", Side::Dispose, "DOT", dec!(1)),
        ];
        let mut ledger = LotLedger::new();

        let injections = reconcile_shortfalls(&events, TaxYear(2024), &mut ledger).unwrap();

        assert_eq!(injections.len(), 2);
        // Sorted by asset, both dated before the earliest event
        assert_eq!(injections[0].asset, "ADA");
        assert_eq!(injections[1].asset, "DOT");
        let expected = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
        assert!(injections.iter().all(|i| i.date == expected));
    }

    #[test]
    fn out_of_range_year_is_an_error() {
        let events = vec![event("2024-02-01", Side::Dispose, "BTC", dec!(1))];
        let mut ledger = LotLedger::new();

        let err = reconcile_shortfalls(&events, TaxYear(i32::MIN), &mut ledger).unwrap_err();

        assert_eq!(err, ReconcileError::SentinelOutOfRange(TaxYear(i32::MIN)));
        assert!(ledger.assets().is_empty());
    }

    #[test]
    fn out_of_range_year_without_shortfall_is_fine() {
        let events = vec![
            event("2024-01-01", Side::Acquire, "BTC", dec!(1)),
            event("2024-02-01", Side::Dispose, "BTC", dec!(1)),
        ];
        let mut ledger = LotLedger::new();

        assert!(reconcile_shortfalls(&events, TaxYear(i32::MIN), &mut ledger)
            .unwrap()
            .is_empty());
    }
}
