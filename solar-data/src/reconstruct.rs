//! Daily-generation reconstruction.
//!
//! Given readings sorted by date (one per date), produce one record per
//! calendar day from the first to the last date:
//!
//! 1. Consecutive known readings one day apart: the day's generation is
//!    the difference, clamped at zero.
//! 2. Known readings `g > 1` days apart: the clamped difference is spread
//!    evenly across the `g` days after the earlier reading.
//! 3. The first date is always 0.
//! 4. Rows flagged `missing` are then overwritten by linear interpolation
//!    between the nearest rows that are not flagged.
//!
//! A clamped negative difference usually means a meter reset or a typo.
//! Clamps are logged and counted on the series rather than raised.

use crate::clean::{clean, CleanReport, DuplicatePolicy};
use crate::enrich::cloud_adjusted_sun_hours;
use crate::interpolation::{interpolate_at, spread_evenly, DataPoint};
use chrono::NaiveDate;
use log::{info, warn};
use solar_core::daily::{DailyRecord, FillMethod};
use solar_core::date_range::DateRange;
use solar_core::error::Result;
use solar_core::reading::{DataFlag, Reading};
use solar_core::table::RawRow;

/// A dense daily series: exactly one record per calendar day, ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DailySeries {
    pub records: Vec<DailyRecord>,
    /// Number of negative cumulative differences clamped to zero.
    pub negative_deltas: usize,
}

impl DailySeries {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Look up a day. The series is dense, so this is an index computation.
    pub fn get(&self, date: NaiveDate) -> Option<&DailyRecord> {
        let first = self.first_date()?;
        let offset = (date - first).num_days();
        if offset < 0 {
            return None;
        }
        self.records
            .get(offset as usize)
            .filter(|record| record.date == date)
    }

    pub fn daily_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.daily_kwh).collect()
    }

    pub fn total_kwh(&self) -> f64 {
        self.records.iter().map(|r| r.daily_kwh).sum()
    }

    /// Readings that would reproduce this series: every day present, with
    /// the cumulative total implied by the running sum of `daily_kwh`
    /// starting from the first day's reading (or 0 when it has none).
    pub fn implied_readings(&self) -> Vec<Reading> {
        let mut total = self
            .records
            .first()
            .and_then(|r| r.cumulative_kwh)
            .unwrap_or(0.0);
        self.records
            .iter()
            .enumerate()
            .map(|(i, record)| {
                if i > 0 {
                    total += record.daily_kwh;
                }
                Reading {
                    date: record.date,
                    cumulative_kwh: Some(total),
                    data_flag: DataFlag::Present,
                    weather: record.weather.clone(),
                }
            })
            .collect()
    }
}

/// A reconstructed series together with the cleaning report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconstruction {
    pub series: DailySeries,
    pub report: CleanReport,
}

/// Expand readings to one record per calendar day. Dates without a
/// reading are synthesized with no cumulative value and no flag.
///
/// `readings` must be ascending with at most one per date, as produced by
/// [`crate::clean::clean`].
pub fn densify(readings: Vec<Reading>) -> Vec<DailyRecord> {
    debug_assert!(
        readings.windows(2).all(|w| w[0].date < w[1].date),
        "readings must be sorted and unique by date"
    );
    let (first, last) = match (readings.first(), readings.last()) {
        (Some(first), Some(last)) => (first.date, last.date),
        _ => return Vec::new(),
    };

    let mut readings = readings.into_iter().peekable();
    DateRange(first, last)
        .map(|date| match readings.next_if(|r| r.date == date) {
            Some(reading) => DailyRecord {
                date,
                cumulative_kwh: reading.cumulative_kwh,
                data_flag: Some(reading.data_flag),
                weather: reading.weather,
                daily_kwh: 0.0,
                fill: FillMethod::Unbounded,
                sun_hours_cloud_adjusted: None,
            },
            None => DailyRecord::synthesized(date),
        })
        .collect()
}

/// Overwrite flagged-missing rows with a linear interpolation between the
/// nearest unflagged neighbours. Returns how many rows were filled.
fn interpolate_flagged(records: &mut [DailyRecord]) -> usize {
    let anchors: Vec<DataPoint> = records
        .iter()
        .enumerate()
        .filter(|(i, r)| *i == 0 || !r.is_flagged_missing())
        .map(|(_, r)| DataPoint {
            date: r.date,
            value: r.daily_kwh,
        })
        .collect();

    let mut filled = 0;
    for record in records.iter_mut().skip(1) {
        if !record.is_flagged_missing() {
            continue;
        }
        let pos = anchors.partition_point(|p| p.date < record.date);
        let before = pos.checked_sub(1).map(|j| &anchors[j]);
        let after = anchors.get(pos);
        let value = match (before, after) {
            (Some(before), Some(after)) => interpolate_at(before, after, record.date),
            (Some(only), None) | (None, Some(only)) => only.value,
            (None, None) => 0.0,
        };
        record.daily_kwh = value.max(0.0);
        record.fill = FillMethod::Interpolated;
        filled += 1;
    }
    filled
}

/// Compute `daily_kwh` for a dense record sequence (the output of
/// [`densify`]).
pub fn compute_daily(records: Vec<DailyRecord>) -> DailySeries {
    let mut records = records;
    for record in records.iter_mut() {
        record.daily_kwh = 0.0;
        record.fill = FillMethod::Unbounded;
    }
    if records.is_empty() {
        return DailySeries::default();
    }

    let mut negative_deltas = 0;
    let mut previous: Option<(usize, f64)> = None;
    for i in 0..records.len() {
        let Some(value) = records[i].known_cumulative() else {
            continue;
        };
        if let Some((prev_index, prev_value)) = previous {
            let raw_delta = value - prev_value;
            if raw_delta < 0.0 {
                negative_deltas += 1;
                warn!(
                    "Cumulative reading fell from {} on {} to {} on {}, clamping to 0",
                    prev_value, records[prev_index].date, value, records[i].date
                );
            }
            let delta = raw_delta.max(0.0);
            let gap = i - prev_index;
            if gap == 1 {
                records[i].daily_kwh = delta;
                records[i].fill = FillMethod::Measured;
            } else {
                let shares = spread_evenly(delta, gap);
                for (record, share) in records[prev_index + 1..=i].iter_mut().zip(shares) {
                    record.daily_kwh = share;
                    record.fill = FillMethod::Distributed;
                }
            }
        }
        previous = Some((i, value));
    }

    records[0].daily_kwh = 0.0;
    records[0].fill = FillMethod::Start;

    let interpolated = interpolate_flagged(&mut records);
    if interpolated > 0 {
        info!("Interpolated {} rows flagged missing", interpolated);
    }

    DailySeries {
        records,
        negative_deltas,
    }
}

/// Fill derived weather attributes.
pub fn enrich(series: DailySeries) -> DailySeries {
    let mut series = series;
    for record in series.records.iter_mut() {
        record.sun_hours_cloud_adjusted = cloud_adjusted_sun_hours(&record.weather);
    }
    series
}

/// Reconstruct a dense daily series from cleaned readings.
pub fn reconstruct(readings: Vec<Reading>) -> DailySeries {
    let series = enrich(compute_daily(densify(readings)));
    if let (Some(first), Some(last)) = (series.first_date(), series.last_date()) {
        info!(
            "Reconstructed {} days from {} to {}, {:.1} kWh total",
            series.len(),
            first,
            last,
            series.total_kwh()
        );
    }
    if series.negative_deltas > 0 {
        warn!(
            "{} negative cumulative deltas were clamped to zero (possible meter reset)",
            series.negative_deltas
        );
    }
    series
}

/// The full pipeline from raw table rows.
pub fn reconstruct_table(rows: Vec<RawRow>, policy: DuplicatePolicy) -> Result<Reconstruction> {
    let table = clean(rows, policy)?;
    Ok(Reconstruction {
        series: reconstruct(table.readings),
        report: table.report,
    })
}
