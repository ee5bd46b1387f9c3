use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Holding period after which a gain counts as long term
pub const LONG_TERM_DAYS: i64 = 365;

/// Holding period classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Term {
    Short,
    Long,
}

impl Term {
    /// Classify by calendar days between acquisition and disposal
    pub fn classify(acquired: NaiveDate, disposed: NaiveDate) -> Term {
        if holding_days(acquired, disposed) < LONG_TERM_DAYS {
            Term::Short
        } else {
            Term::Long
        }
    }

    pub fn display(&self) -> &'static str {
        match self {
            Term::Short => "Short",
            Term::Long => "Long",
        }
    }
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

pub fn holding_days(acquired: NaiveDate, disposed: NaiveDate) -> i64 {
    (disposed - acquired).num_days()
}

pub fn gain_loss(proceeds: Decimal, cost_basis: Decimal) -> Decimal {
    proceeds - cost_basis
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn term_boundary() {
        let bought = date("2023-01-01");
        assert_eq!(Term::classify(bought, bought + Duration::days(364)), Term::Short);
        assert_eq!(Term::classify(bought, bought + Duration::days(365)), Term::Long);
        assert_eq!(Term::classify(bought, bought + Duration::days(800)), Term::Long);
    }

    #[test]
    fn same_day_is_short() {
        let d = date("2024-06-01");
        assert_eq!(holding_days(d, d), 0);
        assert_eq!(Term::classify(d, d), Term::Short);
    }

    #[test]
    fn leap_year_counts_calendar_days() {
        // 2024 has 366 days, so one calendar year later is 366 days on
        assert_eq!(holding_days(date("2024-01-01"), date("2024-12-31")), 365);
        assert_eq!(Term::classify(date("2024-01-01"), date("2024-12-31")), Term::Long);
        assert_eq!(Term::classify(date("2023-01-02"), date("2024-01-01")), Term::Short);
    }

    #[test]
    fn gain_loss_sign() {
        assert_eq!(gain_loss(dec!(200), dec!(150)), dec!(50));
        assert_eq!(gain_loss(dec!(100), dec!(150)), dec!(-50));
    }

    #[test]
    fn term_display() {
        assert_eq!(Term::Short.to_string(), "Short");
        assert_eq!(Term::Long.to_string(), "Long");
    }
}
