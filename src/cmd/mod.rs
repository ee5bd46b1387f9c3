pub mod lots;
pub mod report;
pub mod schema;
pub mod validate;

use crate::core::events::{self, EventLog};
use crate::core::TaxYear;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Read events from a CSV or JSON file (by extension), or CSV from stdin with "-"
pub fn read_events(path: &Path) -> anyhow::Result<EventLog> {
    let log = if path.as_os_str() == "-" {
        read_from_stdin()?
    } else {
        read_from_file(path)?
    };
    log::info!(
        "Read {} events ({} skipped)",
        log.events.len(),
        log.warnings.len()
    );
    Ok(log)
}

fn read_from_file(path: &Path) -> anyhow::Result<EventLog> {
    let file = File::open(path)
        .map_err(|e| anyhow::anyhow!("cannot open {}: {}", path.display(), e))?;
    let reader = BufReader::new(file);
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        events::read_json(reader)
    } else {
        events::read_csv(reader)
    }
}

// Piped input is always CSV; an empty pipe is an error rather than an empty year
fn read_from_stdin() -> anyhow::Result<EventLog> {
    let mut buffer = Vec::new();
    io::stdin().lock().read_to_end(&mut buffer)?;
    if buffer.is_empty() {
        anyhow::bail!("no transactions on stdin; pass a CSV/JSON file or pipe CSV rows");
    }
    events::read_csv(buffer.as_slice())
}

/// Requested tax year, or the previous calendar year
pub fn resolve_tax_year(year: Option<i32>) -> TaxYear {
    year.map(TaxYear)
        .unwrap_or_else(|| TaxYear::previous(chrono::Local::now().date_naive()))
}
