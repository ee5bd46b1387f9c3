use super::output::fixed;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Diagnostics collected while reading events and replaying the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Warning {
    /// Input record could not be parsed and was skipped.
    MalformedRecord { row: usize, reason: String },
    /// Input record has a side the engine does not know; skipped.
    UnknownCategory { row: usize, side: String },
    /// Disposals exceed acquisitions for this asset, so a zero-cost lot
    /// was assumed before the first transaction.
    ShortfallInjected {
        asset: String,
        #[schemars(with = "f64")]
        quantity: Decimal,
        date: NaiveDate,
    },
}

impl Warning {
    pub fn kind(&self) -> &'static str {
        match self {
            Warning::MalformedRecord { .. } => "MalformedRecord",
            Warning::UnknownCategory { .. } => "UnknownCategory",
            Warning::ShortfallInjected { .. } => "ShortfallInjected",
        }
    }

    pub fn message(&self) -> String {
        match self {
            Warning::MalformedRecord { row, reason } => {
                format!("row {}: skipped malformed record ({})", row, reason)
            }
            Warning::UnknownCategory { row, side } => {
                format!("row {}: unknown transaction type '{}', ignored", row, side)
            }
            Warning::ShortfallInjected {
                asset,
                quantity,
                date,
            } => format!(
                "assumed purchase of {} {} on {} at 0 EUR cost basis to cover historical shortfall",
                fixed(*quantity, 8),
                asset,
                date.format("%d.%m.%Y")
            ),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn shortfall_message_uses_eight_decimals() {
        let warning = Warning::ShortfallInjected {
            asset: "BTC".to_string(),
            quantity: dec!(4),
            date: NaiveDate::from_ymd_opt(2022, 12, 31).unwrap(),
        };
        assert_eq!(warning.kind(), "ShortfallInjected");
        assert_eq!(
            warning.message(),
            "assumed purchase of 4.00000000 BTC on 31.12.2022 at 0 EUR cost basis to cover historical shortfall"
        );
    }

    #[test]
    fn warnings_serialize_with_type_tag() {
        let warning = Warning::UnknownCategory {
            row: 3,
            side: "Deposit".to_string(),
        };
        let json = serde_json::to_string(&warning).unwrap();
        assert_eq!(json, r#"{"type":"UnknownCategory","row":3,"side":"Deposit"}"#);
    }
}
