use super::warnings::Warning;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Read;

/// Side of a normalized transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Side {
    Acquire,
    Dispose,
    /// Fee booking; counted in the fee total only, never touches lots
    Fee,
}

impl Side {
    /// Parse a side label, accepting the buy/sell spellings exchanges use
    pub fn parse(s: &str) -> Option<Side> {
        match s.trim().to_lowercase().as_str() {
            "acquire" | "acquisition" | "buy" => Some(Side::Acquire),
            "dispose" | "disposal" | "sell" => Some(Side::Dispose),
            "fee" => Some(Side::Fee),
            _ => None,
        }
    }
}

/// A normalized transaction event, the only input the engine consumes
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionEvent {
    pub datetime: NaiveDateTime,
    pub side: Side,
    pub asset: String,
    pub quantity: Decimal,
    /// EUR value of the whole transaction
    pub counter_value: Decimal,
    /// EUR fee charged on this transaction, if any
    pub fee: Option<Decimal>,
    pub venue: Option<String>,
}

impl TransactionEvent {
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }
}

/// Unified JSON input format
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventInput {
    pub events: Vec<EventRecord>,
}

/// Input record for one transaction (CSV row or JSON object)
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventRecord {
    /// Date and time of the transaction
    pub date: String,
    /// Acquire (Buy), Dispose (Sell) or Fee
    pub side: String,
    /// Asset symbol, e.g. BTC
    pub asset: String,
    /// Quantity of the asset as a decimal string, must be positive
    #[serde(deserialize_with = "deserialize_amount")]
    #[schemars(with = "String")]
    pub quantity: Decimal,
    /// EUR value of the whole transaction as a decimal string
    #[serde(deserialize_with = "deserialize_amount")]
    #[schemars(with = "String")]
    pub counter_value: Decimal,
    /// EUR fee charged on this transaction
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    #[schemars(with = "Option<String>")]
    pub fee: Option<Decimal>,
    /// Exchange or wallet the transaction happened at
    #[serde(default)]
    pub venue: Option<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("invalid date/datetime '{0}'")]
    InvalidDatetime(String),
    #[error("unknown side '{0}'")]
    UnknownSide(String),
    #[error("missing asset")]
    MissingAsset,
    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(Decimal),
    #[error("counter value must not be negative, got {0}")]
    NegativeValue(Decimal),
    #[error("fee must not be negative, got {0}")]
    NegativeFee(Decimal),
}

/// Fields holding amounts; JSON numbers in them are read as their text
const AMOUNT_FIELDS: &[&str] = &["quantity", "counter_value", "fee"];

/// Parse an amount exactly from its text, accepting scientific notation
pub fn parse_amount(s: &str) -> Result<Decimal, rust_decimal::Error> {
    let s = s.trim();
    Decimal::from_str_exact(s).or_else(|_| Decimal::from_scientific(s))
}

// Amounts are read as text so CSV fields never pass through f64
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_amount(&s)
        .map_err(|err| serde::de::Error::custom(format!("invalid amount '{}': {}", s, err)))
}

fn deserialize_optional_amount<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(s) if !s.trim().is_empty() => parse_amount(&s).map(Some).map_err(|err| {
            serde::de::Error::custom(format!("invalid amount '{}': {}", s, err))
        }),
        _ => Ok(None),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d.%m.%Y, %H:%M",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d.%m.%Y"];

/// Parse a date string that may be date-only or datetime format
pub fn parse_datetime(s: &str) -> Result<NaiveDateTime, RecordError> {
    let s = s.trim();
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(dt);
        }
    }
    // Date-only values default to midnight
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Ok(date.and_time(NaiveTime::MIN));
        }
    }
    Err(RecordError::InvalidDatetime(s.to_string()))
}

impl TryFrom<EventRecord> for TransactionEvent {
    type Error = RecordError;

    fn try_from(record: EventRecord) -> Result<Self, Self::Error> {
        let side =
            Side::parse(&record.side).ok_or_else(|| RecordError::UnknownSide(record.side.clone()))?;
        let datetime = parse_datetime(&record.date)?;
        let asset = record.asset.trim().to_uppercase();
        if asset.is_empty() {
            return Err(RecordError::MissingAsset);
        }
        // Fee rows carry their amount in counter_value and need no quantity
        if side != Side::Fee && record.quantity <= Decimal::ZERO {
            return Err(RecordError::NonPositiveQuantity(record.quantity));
        }
        if record.counter_value < Decimal::ZERO {
            return Err(RecordError::NegativeValue(record.counter_value));
        }
        if let Some(fee) = record.fee.filter(|f| *f < Decimal::ZERO) {
            return Err(RecordError::NegativeFee(fee));
        }
        let venue = record
            .venue
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        Ok(TransactionEvent {
            datetime,
            side,
            asset,
            quantity: record.quantity,
            counter_value: record.counter_value,
            fee: record.fee,
            venue,
        })
    }
}

/// Events read from a file together with the records that were skipped
#[derive(Debug, Default)]
pub struct EventLog {
    /// Events in input order
    pub events: Vec<TransactionEvent>,
    pub warnings: Vec<Warning>,
}

impl EventLog {
    fn push_record(&mut self, row: usize, record: EventRecord) {
        match TransactionEvent::try_from(record) {
            Ok(event) => self.events.push(event),
            Err(RecordError::UnknownSide(side)) => {
                log::warn!("Row {}: unknown transaction type '{}', ignored", row, side);
                self.warnings.push(Warning::UnknownCategory { row, side });
            }
            Err(err) => self.push_malformed(row, err.to_string()),
        }
    }

    fn push_malformed(&mut self, row: usize, reason: String) {
        log::warn!("Row {}: skipping malformed record: {}", row, reason);
        self.warnings.push(Warning::MalformedRecord { row, reason });
    }
}

/// Read events from CSV. Rows are numbered from 1, excluding the header.
///
/// Order is preserved; the engine relies on it to break timestamp ties.
pub fn read_csv<R: Read>(reader: R) -> anyhow::Result<EventLog> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut log = EventLog::default();
    for (index, result) in rdr.deserialize::<EventRecord>().enumerate() {
        let row = index + 1;
        match result {
            Ok(record) => log.push_record(row, record),
            Err(err) if err.is_io_error() => return Err(err.into()),
            Err(err) => log.push_malformed(row, err.to_string()),
        }
    }
    Ok(log)
}

/// Read events from JSON. A record that does not deserialize is skipped,
/// an invalid document fails the whole read.
pub fn read_json<R: Read>(reader: R) -> anyhow::Result<EventLog> {
    #[derive(Deserialize)]
    struct RawInput {
        events: Vec<serde_json::Value>,
    }

    let input: RawInput = serde_json::from_reader(reader)?;
    let mut log = EventLog::default();
    for (index, mut value) in input.events.into_iter().enumerate() {
        let row = index + 1;
        amounts_as_text(&mut value);
        match serde_json::from_value::<EventRecord>(value) {
            Ok(record) => log.push_record(row, record),
            Err(err) => log.push_malformed(row, err.to_string()),
        }
    }
    Ok(log)
}

fn amounts_as_text(value: &mut serde_json::Value) {
    let Some(fields) = value.as_object_mut() else {
        return;
    };
    for name in AMOUNT_FIELDS {
        if let Some(field) = fields.get_mut(*name) {
            if let serde_json::Value::Number(n) = field {
                let text = n.to_string();
                *field = serde_json::Value::String(text);
            }
        }
    }
}
