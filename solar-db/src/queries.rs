//! Query methods for the dashboard views.
//!
//! All date parameters and results use `YYYY-MM-DD` strings, matching how
//! dates are stored.

use crate::models::{DateValue, FillCount, MonthTotal, WeatherOverlay, YearDayValue};
use crate::Database;
use chrono::NaiveDate;
use rusqlite::params;
use solar_utils::dates::format_date;

impl Database {
    /// Daily generation between two dates, inclusive, ordered by date.
    pub fn query_daily_generation(
        &self,
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> anyhow::Result<Vec<DateValue>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT date, daily_kwh FROM daily_generation
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(params![format_date(start), format_date(end)], |row| {
                Ok(DateValue {
                    date: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "query: query_daily_generation returned {} records",
            rows.len()
        );
        Ok(rows)
    }

    /// Generation summed per calendar month, oldest month first.
    pub fn query_monthly_totals(&self) -> anyhow::Result<Vec<MonthTotal>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT substr(date, 1, 7) AS month, SUM(daily_kwh), COUNT(*)
             FROM daily_generation
             GROUP BY month
             ORDER BY month",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MonthTotal {
                    month: row.get(0)?,
                    total_kwh: row.get(1)?,
                    days: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!("query: query_monthly_totals returned {} months", rows.len());
        Ok(rows)
    }

    /// The most recent `n` days of the series, in ascending date order.
    pub fn query_last_n_days(&self, n: usize) -> anyhow::Result<Vec<DateValue>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT date, daily_kwh FROM daily_generation
             ORDER BY date DESC
             LIMIT ?1",
        )?;
        let mut rows = stmt
            .query_map(params![n as i64], |row| {
                Ok(DateValue {
                    date: row.get(0)?,
                    value: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        rows.reverse();
        log::info!("query: query_last_n_days returned {} records", rows.len());
        Ok(rows)
    }

    /// Every day of calendar month `month` (1-12) across all years in the
    /// series, ordered by year then day, for overlaying years on a shared
    /// day-of-month axis.
    pub fn query_month_by_year(&self, month: u32) -> anyhow::Result<Vec<YearDayValue>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT CAST(substr(date, 1, 4) AS INTEGER),
                    CAST(substr(date, 9, 2) AS INTEGER),
                    date,
                    daily_kwh
             FROM daily_generation
             WHERE substr(date, 6, 2) = ?1
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(params![format!("{:02}", month)], |row| {
                Ok(YearDayValue {
                    year: row.get(0)?,
                    day: row.get(1)?,
                    date: row.get(2)?,
                    value: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "query: query_month_by_year({}) returned {} records",
            month,
            rows.len()
        );
        Ok(rows)
    }

    /// Daily generation alongside sun hours and conditions, inclusive range.
    pub fn query_weather_overlay(
        &self,
        start: &NaiveDate,
        end: &NaiveDate,
    ) -> anyhow::Result<Vec<WeatherOverlay>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT date, daily_kwh, sun_hours, sun_hours_cloud_adjusted, condition
             FROM daily_generation
             WHERE date >= ?1 AND date <= ?2
             ORDER BY date",
        )?;
        let rows = stmt
            .query_map(params![format_date(start), format_date(end)], |row| {
                Ok(WeatherOverlay {
                    date: row.get(0)?,
                    daily_kwh: row.get(1)?,
                    sun_hours: row.get(2)?,
                    sun_hours_cloud_adjusted: row.get(3)?,
                    condition: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        log::info!(
            "query: query_weather_overlay returned {} records",
            rows.len()
        );
        Ok(rows)
    }

    /// Number of days per fill method, most common first.
    pub fn query_fill_counts(&self) -> anyhow::Result<Vec<FillCount>> {
        let conn = self.conn.borrow();
        let mut stmt = conn.prepare(
            "SELECT fill_method, COUNT(*) AS days
             FROM daily_generation
             GROUP BY fill_method
             ORDER BY days DESC, fill_method",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(FillCount {
                    fill_method: row.get(0)?,
                    days: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// First and last date held, or `None` when the table is empty.
    pub fn query_date_range(&self) -> anyhow::Result<Option<(String, String)>> {
        let conn = self.conn.borrow();
        let (first, last): (Option<String>, Option<String>) = conn.query_row(
            "SELECT MIN(date), MAX(date) FROM daily_generation",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(first.zip(last))
    }
}

#[cfg(test)]
mod tests {
    use crate::Database;
    use chrono::NaiveDate;
    use solar_core::reading::{DataFlag, Reading, Weather};

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// A year of readings: daily steps around the start and end of June,
    /// a two-day gap, then a long gap worth 2 kWh a day.
    ///
    /// 2024-05-30 start 0, 05-31 10, 06-01 15, 06-02 and 06-03 10 each,
    /// 2024-06-04 through 2025-06-01 2 each, 2025-06-02 10, 2025-06-03 12.
    fn sample_db() -> Database {
        let mut last = Reading::new(day(2025, 6, 3), Some(893.0), DataFlag::Present);
        last.weather = Weather {
            sun_hours: Some(10.0),
            cloud_cover_percent: Some(50.0),
            condition: Some("Partially cloudy".to_string()),
            ..Weather::default()
        };
        let readings = vec![
            Reading::new(day(2024, 5, 30), Some(100.0), DataFlag::Present),
            Reading::new(day(2024, 5, 31), Some(110.0), DataFlag::Present),
            Reading::new(day(2024, 6, 1), Some(125.0), DataFlag::Present),
            Reading::new(day(2024, 6, 3), Some(145.0), DataFlag::Present),
            Reading::new(day(2025, 6, 1), Some(871.0), DataFlag::Present),
            Reading::new(day(2025, 6, 2), Some(881.0), DataFlag::Present),
            last,
        ];
        let series = solar_data::reconstruct(readings);

        let db = Database::new().unwrap();
        db.load_daily_records(&series.records).unwrap();
        db
    }

    #[test]
    fn query_daily_generation_returns_inclusive_range() {
        let db = sample_db();
        let rows = db
            .query_daily_generation(&day(2024, 5, 30), &day(2024, 6, 2))
            .unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(
            dates,
            vec!["2024-05-30", "2024-05-31", "2024-06-01", "2024-06-02"]
        );
        let expected = [0.0, 10.0, 15.0, 10.0];
        for (row, want) in rows.iter().zip(expected) {
            assert!((row.value - want).abs() < 0.01, "{}: {}", row.date, row.value);
        }
    }

    #[test]
    fn query_daily_generation_empty_range() {
        let db = sample_db();
        let rows = db
            .query_daily_generation(&day(2030, 1, 1), &day(2030, 1, 31))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn query_monthly_totals_groups_by_month() {
        let db = sample_db();
        let months = db.query_monthly_totals().unwrap();
        assert_eq!(months.len(), 14);

        assert_eq!(months[0].month, "2024-05");
        assert_eq!(months[0].days, 2);
        assert!((months[0].total_kwh - 10.0).abs() < 0.01);

        // 15 + 10 + 10 + 27 days at 2
        assert_eq!(months[1].month, "2024-06");
        assert_eq!(months[1].days, 30);
        assert!((months[1].total_kwh - 89.0).abs() < 0.01);

        let last = months.last().unwrap();
        assert_eq!(last.month, "2025-06");
        assert_eq!(last.days, 3);
        assert!((last.total_kwh - 24.0).abs() < 0.01);
    }

    #[test]
    fn query_last_n_days_is_ascending() {
        let db = sample_db();
        let rows = db.query_last_n_days(3).unwrap();
        let dates: Vec<&str> = rows.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-06-01", "2025-06-02", "2025-06-03"]);
        assert!((rows[2].value - 12.0).abs() < 0.01);
    }

    #[test]
    fn query_last_n_days_more_than_available() {
        let db = sample_db();
        let rows = db.query_last_n_days(1000).unwrap();
        assert_eq!(rows.len(), 370);
        assert_eq!(rows[0].date, "2024-05-30");
    }

    #[test]
    fn query_month_by_year_tags_year_and_day() {
        let db = sample_db();
        let rows = db.query_month_by_year(6).unwrap();
        assert_eq!(rows.len(), 33);

        let first = &rows[0];
        assert_eq!((first.year, first.day), (2024, 1));
        assert!((first.value - 15.0).abs() < 0.01);

        let last = rows.last().unwrap();
        assert_eq!((last.year, last.day), (2025, 3));
        assert_eq!(last.date, "2025-06-03");
        assert!((last.value - 12.0).abs() < 0.01);

        assert!(rows.iter().all(|r| &r.date[5..7] == "06"));
    }

    #[test]
    fn query_month_by_year_no_data() {
        let db = sample_db();
        assert!(db.query_month_by_year(2).unwrap().iter().all(|r| r.year == 2025));
        assert!(Database::new().unwrap().query_month_by_year(2).unwrap().is_empty());
    }

    #[test]
    fn query_weather_overlay_carries_weather() {
        let db = sample_db();
        let rows = db
            .query_weather_overlay(&day(2025, 6, 2), &day(2025, 6, 3))
            .unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].sun_hours, None);
        assert_eq!(rows[0].condition, None);
        assert_eq!(rows[1].sun_hours, Some(10.0));
        assert_eq!(rows[1].sun_hours_cloud_adjusted, Some(5.0));
        assert_eq!(rows[1].condition.as_deref(), Some("Partially cloudy"));
    }

    #[test]
    fn query_fill_counts_tallies_methods() {
        let db = sample_db();
        let counts = db.query_fill_counts().unwrap();
        let lookup = |name: &str| {
            counts
                .iter()
                .find(|c| c.fill_method == name)
                .map(|c| c.days)
        };
        assert_eq!(lookup("distributed"), Some(365));
        assert_eq!(lookup("measured"), Some(4));
        assert_eq!(lookup("start"), Some(1));
        assert_eq!(lookup("interpolated"), None);
        assert_eq!(counts[0].fill_method, "distributed");
    }

    #[test]
    fn query_date_range_spans_series() {
        let db = sample_db();
        let range = db.query_date_range().unwrap();
        assert_eq!(
            range,
            Some(("2024-05-30".to_string(), "2025-06-03".to_string()))
        );
    }
}
