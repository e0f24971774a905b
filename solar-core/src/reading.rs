use crate::error::SolarError;
use crate::table::RawRow;
use chrono::NaiveDate;
use log::warn;
use serde::{Deserialize, Serialize};
use solar_utils::{dates::parse_table_date, numbers::parse_cell};
use std::fmt;

/// Valid cloud cover range in percent.
pub const CLOUD_COVER_RANGE: (f64, f64) = (0.0, 100.0);

/// Valid sunlight hours range.
pub const SUN_HOURS_RANGE: (f64, f64) = (0.0, 24.0);

/// Whether a row holds an actual meter read or a caller-supplied placeholder.
///
/// - `Present`: a real reading (also assumed for an empty cell)
/// - `Missing`: the value is known to be unreliable; its daily figure is
///   interpolated rather than derived from the cumulative total
/// - `Other`: any other tag, preserved verbatim
#[derive(Debug, PartialEq, Eq, Clone, Hash, Serialize, Deserialize)]
pub enum DataFlag {
    Present,
    Missing,
    Other(String),
}

impl DataFlag {
    pub fn parse(s: &str) -> DataFlag {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("present") {
            DataFlag::Present
        } else if trimmed.eq_ignore_ascii_case("missing") {
            DataFlag::Missing
        } else {
            DataFlag::Other(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DataFlag::Present => "present",
            DataFlag::Missing => "missing",
            DataFlag::Other(s) => s.as_str(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, DataFlag::Missing)
    }
}

impl fmt::Display for DataFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Daily weather attributes attached to a row. Every field is optional and
/// none of them take part in reconstruction.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct Weather {
    pub temp_max_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    /// Percent of sky covered, 0-100
    pub cloud_cover_percent: Option<f64>,
    /// Hours of sunlight, 0-24
    pub sun_hours: Option<f64>,
    pub condition: Option<String>,
}

impl Weather {
    /// True when every attribute is present, i.e. nothing left to fetch.
    pub fn is_complete(&self) -> bool {
        self.temp_max_c.is_some()
            && self.temp_min_c.is_some()
            && self.cloud_cover_percent.is_some()
            && self.sun_hours.is_some()
            && self.condition.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.temp_max_c.is_none()
            && self.temp_min_c.is_none()
            && self.cloud_cover_percent.is_none()
            && self.sun_hours.is_none()
            && self.condition.is_none()
    }

    /// Fill absent attributes from `other`. Values already present win.
    pub fn merge_missing(&mut self, other: Weather) {
        self.temp_max_c = self.temp_max_c.or(other.temp_max_c);
        self.temp_min_c = self.temp_min_c.or(other.temp_min_c);
        self.cloud_cover_percent = self.cloud_cover_percent.or(other.cloud_cover_percent);
        self.sun_hours = self.sun_hours.or(other.sun_hours);
        if self.condition.is_none() {
            self.condition = other.condition;
        }
    }

    /// Drop values outside their physical range, logging each one.
    pub fn sanitized(mut self, date: &NaiveDate) -> Weather {
        self.cloud_cover_percent =
            within(self.cloud_cover_percent, CLOUD_COVER_RANGE, "cloud cover", date);
        self.sun_hours = within(self.sun_hours, SUN_HOURS_RANGE, "sun hours", date);
        self
    }
}

fn within(value: Option<f64>, range: (f64, f64), what: &str, date: &NaiveDate) -> Option<f64> {
    match value {
        Some(v) if v < range.0 || v > range.1 => {
            warn!(
                "{}: {} {} outside [{}, {}], treating as absent",
                date, what, v, range.0, range.1
            );
            None
        }
        other => other,
    }
}

/// One row of the source table: a cumulative meter reading for a date.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub date: NaiveDate,
    /// Running total in kWh since an arbitrary epoch; `None` is a gap.
    pub cumulative_kwh: Option<f64>,
    pub data_flag: DataFlag,
    pub weather: Weather,
}

impl Reading {
    pub fn new(date: NaiveDate, cumulative_kwh: Option<f64>, data_flag: DataFlag) -> Reading {
        Reading {
            date,
            cumulative_kwh,
            data_flag,
            weather: Weather::default(),
        }
    }

    /// A reading that can anchor cumulative differencing: it has a value
    /// and is not flagged as unreliable.
    pub fn known_cumulative(&self) -> Option<f64> {
        if self.data_flag.is_missing() {
            None
        } else {
            self.cumulative_kwh
        }
    }
}

/// Parse an optional weather cell. Garbage is treated as absent; weather is
/// never a reason to drop a row.
fn weather_cell(cell: &Option<String>, what: &str, line: u64) -> Option<f64> {
    let raw = cell.as_deref()?;
    match parse_cell(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("line {}: ignoring {} {}", line, what, e);
            None
        }
    }
}

impl TryFrom<RawRow> for Reading {
    type Error = SolarError;

    fn try_from(row: RawRow) -> Result<Self, Self::Error> {
        if let Some(reason) = row.encoding_error {
            return Err(SolarError::InvalidEncoding {
                line: row.line,
                reason,
            });
        }
        let date = parse_table_date(&row.date).map_err(|e| SolarError::InvalidDate {
            line: row.line,
            value: row.date.clone(),
            reason: e.0,
        })?;

        let raw_cumulative = row.cumulative_kwh.as_deref().unwrap_or("");
        let cumulative_kwh = match parse_cell(raw_cumulative) {
            Ok(Some(v)) if v < 0.0 => {
                return Err(SolarError::InvalidReading {
                    line: row.line,
                    value: raw_cumulative.to_string(),
                    reason: "negative cumulative total".to_string(),
                })
            }
            Ok(v) => v,
            Err(reason) => {
                return Err(SolarError::InvalidReading {
                    line: row.line,
                    value: raw_cumulative.to_string(),
                    reason,
                })
            }
        };

        let data_flag = DataFlag::parse(row.data_flag.as_deref().unwrap_or(""));
        let condition = row
            .condition
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);
        let weather = Weather {
            temp_max_c: weather_cell(&row.temp_max_c, "max temperature", row.line),
            temp_min_c: weather_cell(&row.temp_min_c, "min temperature", row.line),
            cloud_cover_percent: weather_cell(&row.cloud_cover_percent, "cloud cover", row.line),
            sun_hours: weather_cell(&row.sun_hours, "sun hours", row.line),
            condition,
        }
        .sanitized(&date);

        Ok(Reading {
            date,
            cumulative_kwh,
            data_flag,
            weather,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(date: &str, cumulative: &str, flag: &str) -> RawRow {
        RawRow {
            line: 2,
            date: date.to_string(),
            cumulative_kwh: Some(cumulative.to_string()),
            data_flag: Some(flag.to_string()),
            ..RawRow::default()
        }
    }

    #[test]
    fn test_data_flag_parse() {
        assert_eq!(DataFlag::parse(""), DataFlag::Present);
        assert_eq!(DataFlag::parse(" MISSING "), DataFlag::Missing);
        assert_eq!(DataFlag::parse("Missing"), DataFlag::Missing);
        assert_eq!(
            DataFlag::parse("Estimated"),
            DataFlag::Other("Estimated".to_string())
        );
        assert_eq!(DataFlag::Other("Estimated".to_string()).as_str(), "Estimated");
    }

    #[test]
    fn test_reading_from_raw_row() {
        let reading: Reading = raw("01/03/2025", "1234.5", "").try_into().unwrap();
        assert_eq!(reading.date, NaiveDate::from_ymd_opt(2025, 3, 1).unwrap());
        assert_eq!(reading.cumulative_kwh, Some(1234.5));
        assert_eq!(reading.data_flag, DataFlag::Present);
        assert!(reading.weather.is_empty());
    }

    #[test]
    fn test_reading_gap_is_not_an_error() {
        let reading: Reading = raw("2025-03-02", "", "missing").try_into().unwrap();
        assert_eq!(reading.cumulative_kwh, None);
        assert!(reading.data_flag.is_missing());
        assert_eq!(reading.known_cumulative(), None);
    }

    #[test]
    fn test_reading_rejects_bad_date_and_value() {
        let bad_date: Result<Reading, _> = raw("32/01/2025", "10", "").try_into();
        assert!(matches!(bad_date, Err(SolarError::InvalidDate { line: 2, .. })));

        let bad_value: Result<Reading, _> = raw("2025-01-02", "ten", "").try_into();
        assert!(matches!(bad_value, Err(SolarError::InvalidReading { .. })));

        let negative: Result<Reading, _> = raw("2025-01-02", "-4", "").try_into();
        assert!(matches!(negative, Err(SolarError::InvalidReading { .. })));
    }

    #[test]
    fn test_reading_rejects_undecodable_row() {
        let row = RawRow {
            encoding_error: Some("invalid utf-8 in field 3".to_string()),
            ..raw("2025-01-02", "", "")
        };
        let result: Result<Reading, _> = row.try_into();
        assert!(matches!(result, Err(SolarError::InvalidEncoding { line: 2, .. })));
        assert!(result.unwrap_err().is_row_error());
    }

    #[test]
    fn test_weather_out_of_range_is_dropped() {
        let mut row = raw("2025-06-01", "10", "");
        row.cloud_cover_percent = Some("140".to_string());
        row.sun_hours = Some("7.5".to_string());
        row.temp_max_c = Some("warm".to_string());
        let reading: Reading = row.try_into().unwrap();
        assert_eq!(reading.weather.cloud_cover_percent, None);
        assert_eq!(reading.weather.sun_hours, Some(7.5));
        assert_eq!(reading.weather.temp_max_c, None);
    }

    #[test]
    fn test_weather_merge_keeps_existing_values() {
        let mut weather = Weather {
            sun_hours: Some(5.0),
            ..Weather::default()
        };
        weather.merge_missing(Weather {
            temp_max_c: Some(21.0),
            temp_min_c: Some(9.0),
            cloud_cover_percent: Some(40.0),
            sun_hours: Some(6.5),
            condition: Some("Partially cloudy".to_string()),
        });
        assert_eq!(weather.sun_hours, Some(5.0));
        assert_eq!(weather.temp_max_c, Some(21.0));
        assert!(weather.is_complete());
    }
}
