pub mod aggregate;
pub mod classify;
pub mod events;
pub mod gains;
pub mod ledger;
pub mod matching;
pub mod output;
pub mod reconcile;
pub mod tax_year;
pub mod warnings;

// Flat public surface for domain types and functions.
pub use aggregate::GainRecord;
pub use events::EventInput;
pub use gains::{calculate_gains, GainsError, GainsOptions, GainsReport, Totals};
pub use ledger::{Lot, LotLedger};
pub use tax_year::TaxYear;
pub use warnings::Warning;
