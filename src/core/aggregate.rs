use super::classify::Term;
use super::matching::DisposalMatch;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// One row of the gains report, either a single match or a group of them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GainRecord {
    pub quantity: Decimal,
    pub asset: String,
    pub disposal_date: NaiveDate,
    pub acquisition_date: NaiveDate,
    pub term: Term,
    pub acquisition_venue: Option<String>,
    pub disposal_venue: Option<String>,
    pub proceeds: Decimal,
    pub cost_basis: Decimal,
    pub gain_loss: Decimal,
}

impl From<&DisposalMatch> for GainRecord {
    fn from(m: &DisposalMatch) -> Self {
        GainRecord {
            quantity: m.quantity,
            asset: m.asset.clone(),
            disposal_date: m.disposal_date(),
            acquisition_date: m.acquisition_date(),
            term: m.term,
            acquisition_venue: m.acquisition_venue.clone(),
            disposal_venue: m.disposal_venue.clone(),
            proceeds: m.proceeds,
            cost_basis: m.cost_basis,
            gain_loss: m.gain_loss,
        }
    }
}

type GroupKey = (String, NaiveDate, NaiveDate);

/// Collapse matches sharing (asset, disposal date, acquisition date).
///
/// Quantities and amounts are summed. Term and venues come from the first
/// match of each group; groups are returned in first-seen order.
pub fn aggregate<'a, I>(matches: I) -> Vec<GainRecord>
where
    I: IntoIterator<Item = &'a DisposalMatch>,
{
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut records: Vec<GainRecord> = Vec::new();

    for m in matches {
        let key = (m.asset.clone(), m.disposal_date(), m.acquisition_date());
        match index.get(&key) {
            Some(&i) => {
                let record = &mut records[i];
                record.quantity += m.quantity;
                record.proceeds += m.proceeds;
                record.cost_basis += m.cost_basis;
                record.gain_loss += m.gain_loss;
            }
            None => {
                index.insert(key, records.len());
                records.push(GainRecord::from(m));
            }
        }
    }

    records
}

/// Sort by (disposal date, acquisition date); ties keep their order
pub fn sort_records(records: &mut [GainRecord]) {
    records.sort_by_key(|r| (r.disposal_date, r.acquisition_date));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use rust_decimal_macros::dec;

    fn m(asset: &str, acquired: &str, disposed: &str, qty: Decimal, proceeds: Decimal, cost: Decimal) -> DisposalMatch {
        let parse = |s: &str| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap();
        let acquired_at = parse(acquired);
        let disposed_at = parse(disposed);
        DisposalMatch {
            asset: asset.to_string(),
            quantity: qty,
            acquired_at,
            disposed_at,
            proceeds,
            cost_basis: cost,
            gain_loss: proceeds - cost,
            term: Term::classify(acquired_at.date(), disposed_at.date()),
            acquisition_venue: Some("BSDEX".to_string()),
            disposal_venue: Some("BSDEX".to_string()),
            synthetic: false,
        }
    }

    #[test]
    fn groups_by_asset_and_dates() {
        let matches = vec![
            m("BTC", "2024-01-01 09:00", "2024-03-01 10:00", dec!(1), dec!(150), dec!(100)),
            m("BTC", "2024-01-01 17:00", "2024-03-01 18:00", dec!(2), dec!(310), dec!(220)),
            m("ETH", "2024-01-01 09:00", "2024-03-01 10:00", dec!(5), dec!(50), dec!(60)),
            m("BTC", "2024-01-02 09:00", "2024-03-01 10:00", dec!(1), dec!(160), dec!(120)),
        ];

        let records = aggregate(&matches);

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].asset, "BTC");
        assert_eq!(records[0].quantity, dec!(3));
        assert_eq!(records[0].proceeds, dec!(460));
        assert_eq!(records[0].cost_basis, dec!(320));
        assert_eq!(records[0].gain_loss, dec!(140));
        assert_eq!(records[1].asset, "ETH");
        assert_eq!(records[1].gain_loss, dec!(-10));
        assert_eq!(records[2].acquisition_date, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
    }

    #[test]
    fn aggregation_preserves_gain_total() {
        let matches = vec![
            m("BTC", "2023-01-01 09:00", "2024-03-01 10:00", dec!(0.3), dec!(9000.123), dec!(4000.5)),
            m("BTC", "2023-01-01 10:00", "2024-03-01 11:00", dec!(0.2), dec!(6000.456), dec!(2500.25)),
            m("BTC", "2024-02-01 10:00", "2024-03-01 11:00", dec!(0.1), dec!(3000.789), dec!(2900)),
            m("DOT", "2024-02-01 10:00", "2024-04-01 11:00", dec!(10), dec!(70), dec!(90)),
        ];

        let grouped: Decimal = aggregate(&matches).iter().map(|r| r.gain_loss).sum();
        let single: Decimal = matches.iter().map(|m| m.gain_loss).sum();

        assert_eq!(grouped, single);
    }

    #[test]
    fn sort_by_disposal_then_acquisition() {
        let matches = vec![
            m("BTC", "2024-01-05 09:00", "2024-03-02 10:00", dec!(1), dec!(1), dec!(1)),
            m("BTC", "2024-01-03 09:00", "2024-03-02 10:00", dec!(1), dec!(1), dec!(1)),
            m("ETH", "2024-01-04 09:00", "2024-03-01 10:00", dec!(1), dec!(1), dec!(1)),
        ];
        let mut records: Vec<GainRecord> = matches.iter().map(GainRecord::from).collect();

        sort_records(&mut records);

        let keys: Vec<_> = records
            .iter()
            .map(|r| (r.disposal_date.to_string(), r.acquisition_date.to_string()))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("2024-03-01".to_string(), "2024-01-04".to_string()),
                ("2024-03-02".to_string(), "2024-01-03".to_string()),
                ("2024-03-02".to_string(), "2024-01-05".to_string()),
            ]
        );
    }
}
