use crate::reading::{DataFlag, Weather};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a day's generation figure was obtained.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum FillMethod {
    /// First date of the series; nothing is known before it, so 0.
    Start,
    /// Difference of readings on this day and the day before.
    Measured,
    /// Even share of a delta spread across a multi-day gap.
    Distributed,
    /// Linear interpolation for a row flagged as missing.
    Interpolated,
    /// No known reading on one side of this date; 0.
    Unbounded,
}

impl FillMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FillMethod::Start => "start",
            FillMethod::Measured => "measured",
            FillMethod::Distributed => "distributed",
            FillMethod::Interpolated => "interpolated",
            FillMethod::Unbounded => "unbounded",
        }
    }
}

impl fmt::Display for FillMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One calendar day of the dense output series.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    /// Carried from the input; `None` for gaps and synthesized dates.
    pub cumulative_kwh: Option<f64>,
    /// `None` for dates synthesized to fill a gap.
    pub data_flag: Option<DataFlag>,
    pub weather: Weather,
    /// Energy generated during this day, never negative.
    pub daily_kwh: f64,
    pub fill: FillMethod,
    pub sun_hours_cloud_adjusted: Option<f64>,
}

impl DailyRecord {
    /// A placeholder for a date with no row in the input.
    pub fn synthesized(date: NaiveDate) -> DailyRecord {
        DailyRecord {
            date,
            cumulative_kwh: None,
            data_flag: None,
            weather: Weather::default(),
            daily_kwh: 0.0,
            fill: FillMethod::Unbounded,
            sun_hours_cloud_adjusted: None,
        }
    }

    pub fn is_synthesized(&self) -> bool {
        self.data_flag.is_none()
    }

    pub fn is_flagged_missing(&self) -> bool {
        self.data_flag.as_ref().is_some_and(DataFlag::is_missing)
    }

    /// The cumulative total, if this day can anchor differencing. Values on
    /// rows flagged missing are not trusted.
    pub fn known_cumulative(&self) -> Option<f64> {
        if self.is_flagged_missing() {
            None
        } else {
            self.cumulative_kwh
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthesized_record() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let record = DailyRecord::synthesized(date);
        assert!(record.is_synthesized());
        assert!(!record.is_flagged_missing());
        assert_eq!(record.known_cumulative(), None);
        assert_eq!(record.fill, FillMethod::Unbounded);
    }

    #[test]
    fn test_flagged_value_is_not_known() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 2).unwrap();
        let mut record = DailyRecord::synthesized(date);
        record.cumulative_kwh = Some(42.0);
        record.data_flag = Some(DataFlag::Missing);
        assert_eq!(record.known_cumulative(), None);
        record.data_flag = Some(DataFlag::Other("estimated".to_string()));
        assert_eq!(record.known_cumulative(), Some(42.0));
    }
}
