use clap::{Parser, Subcommand};

mod cmd;
mod core;

#[derive(Parser, Debug)]
#[command(name = "taxfifo", version, about = "FIFO capital gains report for crypto assets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate realized gains for a tax year and write the gains table
    Report(cmd::report::ReportCommand),
    /// Show the open FIFO lots left after all disposals
    Lots(cmd::lots::LotsCommand),
    /// Check an input file for skipped rows and assumed holdings
    Validate(cmd::validate::ValidateCommand),
    /// Print the expected input format
    Schema(cmd::schema::SchemaCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Report(report) => report.exec(),
        Command::Lots(lots) => lots.exec(),
        Command::Validate(validate) => validate.exec(),
        Command::Schema(schema) => schema.exec(),
    }
}
