//! Loading reconstructed daily records into the in-memory database.

use crate::Database;
use rusqlite::params;
use solar_core::daily::DailyRecord;
use solar_utils::dates::format_date;

impl Database {
    /// Load a dense daily series.
    ///
    /// Rows are keyed by date; loading the same date twice replaces it.
    pub fn load_daily_records(&self, records: &[DailyRecord]) -> anyhow::Result<()> {
        let mut conn = self.conn.borrow_mut();
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO daily_generation (
                    date, cumulative_kwh, data_flag, daily_kwh, fill_method,
                    temp_max_c, temp_min_c, cloud_cover_percent, sun_hours, condition,
                    sun_hours_cloud_adjusted
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for record in records {
                let weather = &record.weather;
                stmt.execute(params![
                    format_date(&record.date),
                    record.cumulative_kwh,
                    record.data_flag.as_ref().map(|f| f.as_str().to_string()),
                    record.daily_kwh,
                    record.fill.as_str(),
                    weather.temp_max_c,
                    weather.temp_min_c,
                    weather.cloud_cover_percent,
                    weather.sun_hours,
                    weather.condition,
                    record.sun_hours_cloud_adjusted,
                ])?;
            }
        }
        tx.commit()?;
        log::info!("loader: Loaded {} daily records", records.len());
        Ok(())
    }
}
