//! Rebuild the derived columns of the readings table.

use crate::persist::{duplicate_policy, load_table, log_report, save_series};
use solar_data::{reconstruct, Reconstruction};

/// Load the table, reconstruct the dense daily series and write it back.
pub fn run_update_daily(csv: &str, strict: bool) -> anyhow::Result<Reconstruction> {
    let table = load_table(csv, duplicate_policy(strict))?;
    let series = reconstruct(table.readings);
    save_series(csv, &series)?;
    log_report(&table.report, &series);
    Ok(Reconstruction {
        series,
        report: table.report,
    })
}
