//! Query result model structs.
//!
//! All structs derive `Serialize` so a front end can take them as JSON.

use serde::Serialize;

/// A single (date, value) pair used for line and bar chart data points.
///
/// `value` is the day's generation in kWh.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DateValue {
    pub date: String,
    pub value: f64,
}

/// Generation summed over one calendar month.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MonthTotal {
    /// `YYYY-MM`
    pub month: String,
    pub total_kwh: f64,
    /// Number of days of the month present in the series.
    pub days: i64,
}

/// One day of a given calendar month, tagged with its year so several
/// years of the same month can be overlaid on a shared day-of-month axis.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct YearDayValue {
    pub year: i32,
    /// Day of the month, 1-31.
    pub day: u32,
    pub date: String,
    pub value: f64,
}

/// Daily generation next to the weather that explains it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WeatherOverlay {
    pub date: String,
    pub daily_kwh: f64,
    pub sun_hours: Option<f64>,
    pub sun_hours_cloud_adjusted: Option<f64>,
    pub condition: Option<String>,
}

/// How many days were produced by each fill method.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FillCount {
    pub fill_method: String,
    pub days: i64,
}
