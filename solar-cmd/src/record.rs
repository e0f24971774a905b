//! Save a cumulative meter reading into the table.

use crate::persist::{duplicate_policy, load_table, log_report, save_series};
use anyhow::{anyhow, bail};
use chrono::{Local, NaiveDate};
use log::info;
use solar_core::reading::{DataFlag, Reading};
use solar_data::{clean_readings, reconstruct, Reconstruction};
use solar_utils::dates::parse_table_date;

/// Set the cumulative reading for `date`, replacing any value already
/// recorded for it. Weather on an existing row is kept.
pub fn upsert_reading(readings: &mut Vec<Reading>, date: NaiveDate, kwh: f64) {
    match readings.iter_mut().find(|r| r.date == date) {
        Some(existing) => {
            info!(
                "Replacing reading for {}: {:?} -> {}",
                date, existing.cumulative_kwh, kwh
            );
            existing.cumulative_kwh = Some(kwh);
            existing.data_flag = DataFlag::Present;
        }
        None => readings.push(Reading::new(date, Some(kwh), DataFlag::Present)),
    }
}

/// Record `kwh` for `date` (today when `None`) and rewrite the table.
pub fn run_record(csv: &str, kwh: f64, date: Option<&str>) -> anyhow::Result<Reconstruction> {
    if !kwh.is_finite() || kwh < 0.0 {
        bail!("meter reading must be a non-negative number of kWh, got {}", kwh);
    }
    let date = match date {
        Some(s) => parse_table_date(s).map_err(|e| anyhow!("bad --date {:?}: {}", s, e))?,
        None => Local::now().date_naive(),
    };

    let table = load_table(csv, duplicate_policy(false))?;
    let mut readings = table.readings;
    upsert_reading(&mut readings, date, kwh);
    let readings = clean_readings(readings, duplicate_policy(true))?.readings;

    let series = reconstruct(readings);
    save_series(csv, &series)?;
    log_report(&table.report, &series);
    info!("Saved reading of {} kWh for {}", kwh, date);
    Ok(Reconstruction {
        series,
        report: table.report,
    })
}
