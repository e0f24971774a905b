//! Data processing for solar meter readings.
//!
//! This crate turns a sparse table of cumulative meter readings into a
//! dense daily generation series. The work is a pipeline of owned
//! snapshots, each stage testable on its own:
//!
//! `parse -> clean -> densify -> compute_daily -> enrich`
//!
//! Nothing here performs I/O; loading and saving the table is the caller's
//! job (see `solar_core::table`).

pub mod clean;
pub mod reconstruct;

pub use clean::{clean, clean_readings, CleanReport, CleanTable, DuplicatePolicy};
pub use reconstruct::{
    compute_daily, densify, reconstruct, reconstruct_table, DailySeries, Reconstruction,
};

/// Linear interpolation and even spreading of deltas across days.
pub mod interpolation {
    use chrono::NaiveDate;

    /// A single data point for interpolation
    #[derive(Debug, Clone, PartialEq)]
    pub struct DataPoint {
        pub date: NaiveDate,
        pub value: f64,
    }

    /// Value on `date` of the straight line through `start` and `end`.
    ///
    /// If start and end fall on the same day, returns the start value.
    pub fn interpolate_at(start: &DataPoint, end: &DataPoint, date: NaiveDate) -> f64 {
        let span = (end.date - start.date).num_days();
        if span <= 0 {
            return start.value;
        }
        let offset = (date - start.date).num_days() as f64;
        start.value + (end.value - start.value) * offset / span as f64
    }

    /// Split `delta` into `days` equal shares.
    ///
    /// The last share absorbs the floating-point remainder so the shares
    /// add back up to `delta`.
    pub fn spread_evenly(delta: f64, days: usize) -> Vec<f64> {
        if days == 0 {
            return Vec::new();
        }
        let share = delta / days as f64;
        let mut shares = vec![share; days];
        let head: f64 = shares[..days - 1].iter().sum();
        shares[days - 1] = delta - head;
        shares
    }

}

/// Weather-derived attributes.
pub mod enrich {
    use solar_core::reading::Weather;
    use solar_utils::numbers::round_tenth;

    /// Sunlight hours scaled by the clear fraction of the sky, rounded to
    /// one decimal. Defined only when both inputs are present.
    pub fn cloud_adjusted_sun_hours(weather: &Weather) -> Option<f64> {
        let sun = weather.sun_hours?;
        let cloud = weather.cloud_cover_percent?;
        Some(round_tenth(sun * (1.0 - cloud / 100.0)))
    }

}

/// Smoothing for dashboard lines.
pub mod rolling {
    /// Mean of each value and the `window - 1` values before it. The first
    /// `window - 1` positions have no full window and are `None`.
    pub fn trailing_mean(values: &[f64], window: usize) -> Vec<Option<f64>> {
        if window == 0 {
            return vec![None; values.len()];
        }
        let mut sum = 0.0;
        values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                sum += v;
                if i >= window {
                    sum -= values[i - window];
                }
                if i + 1 >= window {
                    Some(sum / window as f64)
                } else {
                    None
                }
            })
            .collect()
    }

}
