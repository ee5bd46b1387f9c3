use chrono::{Datelike, Duration, NaiveDate};

/// Calendar tax year (1 January to 31 December)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaxYear(pub i32);

impl TaxYear {
    /// Tax year a date falls into
    pub fn from_date(date: NaiveDate) -> Self {
        TaxYear(date.year())
    }

    /// The year before `today`, which is the year usually being filed
    pub fn previous(today: NaiveDate) -> Self {
        TaxYear(Self::from_date(today).0 - 1)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        Self::from_date(date) == *self
    }

    /// Acquisition date assigned to synthetic lots.
    ///
    /// 31 December two years before this tax year, moved to the day before
    /// `earliest` when the history reaches back further than that.
    pub fn sentinel_date(&self, earliest: Option<NaiveDate>) -> Option<NaiveDate> {
        let sentinel = NaiveDate::from_ymd_opt(self.0.checked_sub(2)?, 12, 31)?;
        match earliest {
            Some(first) if first <= sentinel => first.checked_sub_signed(Duration::days(1)),
            _ => Some(sentinel),
        }
    }

    pub fn display(&self) -> String {
        self.0.to_string()
    }
}

impl std::fmt::Display for TaxYear {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn tax_year_from_date_is_calendar_year() {
        assert_eq!(TaxYear::from_date(date(2024, 1, 1)), TaxYear(2024));
        assert_eq!(TaxYear::from_date(date(2024, 12, 31)), TaxYear(2024));
        assert_eq!(TaxYear::from_date(date(2025, 1, 1)), TaxYear(2025));
    }

    #[test]
    fn previous_year_default() {
        assert_eq!(TaxYear::previous(date(2026, 3, 15)), TaxYear(2025));
    }

    #[test]
    fn contains_checks_year_only() {
        let ty = TaxYear(2024);
        assert!(ty.contains(date(2024, 6, 30)));
        assert!(!ty.contains(date(2023, 12, 31)));
        assert!(!ty.contains(date(2025, 1, 1)));
    }

    #[test]
    fn sentinel_two_years_back() {
        let ty = TaxYear(2024);
        assert_eq!(ty.sentinel_date(None), Some(date(2022, 12, 31)));
        assert_eq!(
            ty.sentinel_date(Some(date(2023, 5, 1))),
            Some(date(2022, 12, 31))
        );
    }

    #[test]
    fn sentinel_moves_before_older_history() {
        let ty = TaxYear(2024);
        assert_eq!(
            ty.sentinel_date(Some(date(2021, 3, 10))),
            Some(date(2021, 3, 9))
        );
        // Same day as the sentinel still has to sort strictly before
        assert_eq!(
            ty.sentinel_date(Some(date(2022, 12, 31))),
            Some(date(2022, 12, 30))
        );
    }

    #[test]
    fn sentinel_out_of_range() {
        assert_eq!(TaxYear(i32::MIN).sentinel_date(None), None);
        assert_eq!(TaxYear(-300_000).sentinel_date(None), None);
        assert_eq!(TaxYear(2024).sentinel_date(Some(NaiveDate::MIN)), None);
    }

    #[test]
    fn tax_year_display() {
        assert_eq!(TaxYear(2024).display(), "2024");
        assert_eq!(TaxYear(2024).to_string(), "2024");
    }
}
