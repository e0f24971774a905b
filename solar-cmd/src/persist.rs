//! Loading and saving the readings table for the subcommands.

use anyhow::Context;
use log::info;
use solar_core::table::{read_table, write_table};
use solar_data::{clean, CleanReport, CleanTable, DailySeries, DuplicatePolicy};
use std::path::Path;

pub fn duplicate_policy(strict: bool) -> DuplicatePolicy {
    if strict {
        DuplicatePolicy::Strict
    } else {
        DuplicatePolicy::KeepLast
    }
}

/// Read and clean the table at `csv`. A missing file is an empty table.
pub fn load_table(csv: &str, policy: DuplicatePolicy) -> anyhow::Result<CleanTable> {
    let rows = read_table(Path::new(csv)).with_context(|| format!("reading {}", csv))?;
    let table = clean(rows, policy).with_context(|| format!("cleaning {}", csv))?;
    Ok(table)
}

/// Replace the table at `csv` with `series`.
pub fn save_series(csv: &str, series: &DailySeries) -> anyhow::Result<()> {
    write_table(Path::new(csv), &series.records).with_context(|| format!("writing {}", csv))?;
    Ok(())
}

pub fn log_report(report: &CleanReport, series: &DailySeries) {
    info!(
        "{} rows read, {} discarded ({} undecodable), {} duplicates replaced, {} days written, {} negative deltas clamped",
        report.total_rows,
        report.discarded(),
        report.invalid_encodings,
        report.duplicates_replaced,
        series.len(),
        series.negative_deltas
    );
}
