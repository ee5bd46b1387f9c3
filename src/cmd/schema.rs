//! Schema command - describe the transaction file the other commands read

use crate::core::EventInput;
use clap::Args;
use schemars::schema_for;

#[derive(Args, Debug)]
pub struct SchemaCommand {
    /// What to print about the transaction file
    #[arg(value_enum, default_value = "json-schema")]
    format: SchemaFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SchemaFormat {
    /// JSON Schema of an `{"events": [...]}` document
    JsonSchema,
    /// Header line to start a CSV transaction file with
    CsvHeader,
    /// One line per CSV column: name, whether it may be empty, meaning
    CsvFields,
}

fn column_names() -> Vec<&'static str> {
    CSV_FIELDS.iter().map(|(name, _, _)| *name).collect()
}

impl SchemaCommand {
    pub fn exec(&self) -> anyhow::Result<()> {
        match self.format {
            SchemaFormat::JsonSchema => {
                let schema = schema_for!(EventInput);
                println!("{}", serde_json::to_string_pretty(&schema)?);
            }
            SchemaFormat::CsvHeader => println!("{}", column_names().join(",")),
            SchemaFormat::CsvFields => print_columns(),
        }
        Ok(())
    }
}

fn print_columns() {
    println!("Transaction columns (amounts in {})", crate::core::output::BASE_CURRENCY);
    println!();
    for (name, required, description) in CSV_FIELDS {
        let presence = if *required { "required" } else { "optional" };
        println!("  {:14} {:9} {}", name, presence, description);
    }
    println!();
    println!("Amounts are read as exact decimals; write them as plain text, not rounded.");
    println!("Rows that cannot be read, or carry another side, are skipped and listed by `validate`.");
}

const CSV_FIELDS: &[(&str, bool, &str)] = &[
    (
        "date",
        true,
        "Transaction time, e.g. 2024-03-05 14:30:00, 05.03.2024, 14:30 or 2024-03-05",
    ),
    ("side", true, "Acquire (Buy), Dispose (Sell) or Fee"),
    ("asset", true, "Asset symbol, e.g. BTC"),
    ("quantity", true, "Quantity of the asset, positive (0 allowed for Fee)"),
    (
        "counter_value",
        true,
        "EUR value of the whole transaction; the fee amount for Fee rows",
    ),
    ("fee", false, "EUR fee charged on this transaction"),
    ("venue", false, "Exchange or wallet, shown in the Buy/Sell at columns"),
];
