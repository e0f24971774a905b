//! Cleaning: raw table rows to a sorted, date-unique reading sequence.
//!
//! Malformed rows (bad date, non-numeric or negative reading) are dropped
//! and counted, never fatal. Duplicate dates keep the last row seen unless
//! the caller asks for strict uniqueness.

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::Serialize;
use solar_core::error::{Result, SolarError};
use solar_core::reading::Reading;
use solar_core::table::RawRow;
use std::collections::BTreeMap;

/// What to do when two rows share a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// The later row replaces the earlier one.
    #[default]
    KeepLast,
    /// Fail with `SolarError::DuplicateDate`.
    Strict,
}

/// Counters describing what cleaning did to the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanReport {
    pub total_rows: usize,
    pub invalid_dates: usize,
    pub invalid_readings: usize,
    pub invalid_encodings: usize,
    pub duplicates_replaced: usize,
}

impl CleanReport {
    /// Rows dropped as malformed.
    pub fn discarded(&self) -> usize {
        self.invalid_dates + self.invalid_readings + self.invalid_encodings
    }
}

/// Cleaned readings, ascending by date with at most one per date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CleanTable {
    pub readings: Vec<Reading>,
    pub report: CleanReport,
}

fn dedupe(
    readings: Vec<Reading>,
    policy: DuplicatePolicy,
    report: &mut CleanReport,
) -> Result<Vec<Reading>> {
    let mut by_date: BTreeMap<NaiveDate, Reading> = BTreeMap::new();
    for reading in readings {
        let date = reading.date;
        if by_date.insert(date, reading).is_some() {
            if policy == DuplicatePolicy::Strict {
                return Err(SolarError::DuplicateDate(date));
            }
            debug!("Duplicate reading for {}, keeping the last one", date);
            report.duplicates_replaced += 1;
        }
    }
    Ok(by_date.into_values().collect())
}

/// Parse and clean raw table rows.
pub fn clean(rows: Vec<RawRow>, policy: DuplicatePolicy) -> Result<CleanTable> {
    let mut report = CleanReport {
        total_rows: rows.len(),
        ..CleanReport::default()
    };
    let mut parsed = Vec::with_capacity(rows.len());
    for row in rows {
        match Reading::try_from(row) {
            Ok(reading) => parsed.push(reading),
            Err(e) if e.is_row_error() => {
                warn!("Dropping row, {}", e);
                match e {
                    SolarError::InvalidDate { .. } => report.invalid_dates += 1,
                    SolarError::InvalidEncoding { .. } => report.invalid_encodings += 1,
                    _ => report.invalid_readings += 1,
                }
            }
            Err(e) => return Err(e),
        }
    }

    let readings = dedupe(parsed, policy, &mut report)?;
    if report.discarded() > 0 {
        warn!(
            "{} of {} rows discarded ({} invalid dates, {} invalid readings, {} undecodable)",
            report.discarded(),
            report.total_rows,
            report.invalid_dates,
            report.invalid_readings,
            report.invalid_encodings
        );
    }
    info!(
        "Cleaned {} rows into {} readings",
        report.total_rows,
        readings.len()
    );
    Ok(CleanTable { readings, report })
}

/// Sort and de-duplicate readings that are already typed.
pub fn clean_readings(readings: Vec<Reading>, policy: DuplicatePolicy) -> Result<CleanTable> {
    let mut report = CleanReport {
        total_rows: readings.len(),
        ..CleanReport::default()
    };
    let readings = dedupe(readings, policy, &mut report)?;
    Ok(CleanTable { readings, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solar_core::reading::DataFlag;
    use solar_core::table::parse_table;

    const MESSY: &str = "\
Date,Cumulative_kWh,Data_Flag
05/01/2025,150,
not-a-date,120,
01/01/2025,100,
03/01/2025,abc,
02/01/2025,110,
05/01/2025,155,
31/02/2025,200,
";

    #[test]
    fn test_clean_drops_counts_and_sorts() {
        let table = clean(parse_table(MESSY).unwrap(), DuplicatePolicy::KeepLast).unwrap();
        let report = &table.report;
        assert_eq!(report.total_rows, 7);
        assert_eq!(report.invalid_dates, 2);
        assert_eq!(report.invalid_readings, 1);
        assert_eq!(report.discarded(), 3);
        assert_eq!(report.duplicates_replaced, 1);

        let dates: Vec<String> = table
            .readings
            .iter()
            .map(|r| r.date.format("%Y-%m-%d").to_string())
            .collect();
        assert_eq!(dates, vec!["2025-01-01", "2025-01-02", "2025-01-05"]);
        // last-seen wins
        assert_eq!(table.readings[2].cumulative_kwh, Some(155.0));
    }

    #[test]
    fn test_clean_strict_rejects_duplicates() {
        let result = clean(parse_table(MESSY).unwrap(), DuplicatePolicy::Strict);
        let expected = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
        assert!(matches!(result, Err(SolarError::DuplicateDate(d)) if d == expected));
    }

    #[test]
    fn test_clean_fully_invalid_input() {
        let csv = "Date,Cumulative_kWh\nyesterday,1\n,2\n2025-01-01,-3\n";
        let table = clean(parse_table(csv).unwrap(), DuplicatePolicy::KeepLast).unwrap();
        assert!(table.readings.is_empty());
        assert_eq!(table.report.discarded(), table.report.total_rows);
        assert_eq!(table.report.total_rows, 3);
    }

    #[test]
    fn test_clean_drops_undecodable_row() {
        let mut rows = parse_table("Date,Cumulative_kWh\n2025-01-01,100\n2025-01-03,120\n").unwrap();
        rows.insert(
            1,
            RawRow {
                line: 3,
                date: "2025-01-02".to_string(),
                encoding_error: Some("invalid utf-8".to_string()),
                ..RawRow::default()
            },
        );
        let table = clean(rows, DuplicatePolicy::KeepLast).unwrap();
        assert_eq!(table.readings.len(), 2);
        assert_eq!(table.report.invalid_encodings, 1);
        assert_eq!(table.report.discarded(), 1);
        assert_eq!(table.report.total_rows, 3);
    }

    #[test]
    fn test_clean_readings_keeps_last() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let readings = vec![
            Reading::new(date, Some(10.0), DataFlag::Present),
            Reading::new(date.pred_opt().unwrap(), Some(5.0), DataFlag::Present),
            Reading::new(date, Some(12.0), DataFlag::Present),
        ];
        let table = clean_readings(readings, DuplicatePolicy::KeepLast).unwrap();
        assert_eq!(table.readings.len(), 2);
        assert_eq!(table.readings[1].cumulative_kwh, Some(12.0));
        assert_eq!(table.report.duplicates_replaced, 1);
        assert_eq!(table.report.discarded(), 0);
    }
}
