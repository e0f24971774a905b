//! Fill missing weather columns from a weather source.

use crate::persist::{duplicate_policy, load_table, log_report, save_series};
use log::{info, warn};
use solar_core::reading::Reading;
use solar_core::weather::{VisualCrossingClient, WeatherSource};
use solar_data::{reconstruct, Reconstruction};
use std::time::Duration;

/// Pause between consecutive weather requests.
const REQUEST_PAUSE: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WeatherFillStats {
    pub requested: usize,
    pub filled: usize,
    pub failed: usize,
}

/// Request weather for every reading whose weather is incomplete and fill
/// the absent fields. A failed lookup leaves the reading as it was.
pub async fn fill_missing_weather<S: WeatherSource>(
    readings: &mut [Reading],
    source: &S,
    pause: Duration,
) -> WeatherFillStats {
    let mut stats = WeatherFillStats::default();
    for reading in readings.iter_mut().filter(|r| !r.weather.is_complete()) {
        if stats.requested > 0 && !pause.is_zero() {
            tokio::time::sleep(pause).await;
        }
        stats.requested += 1;
        match source.fetch_day(reading.date).await {
            Ok(weather) => {
                reading.weather.merge_missing(weather);
                stats.filled += 1;
            }
            Err(e) => {
                warn!("No weather for {}: {}", reading.date, e);
                stats.failed += 1;
            }
        }
    }
    stats
}

/// Load the table, enrich it from `source` (if any), reconstruct and write
/// it back.
pub async fn update_weather<S: WeatherSource>(
    csv: &str,
    source: Option<&S>,
    pause: Duration,
    strict: bool,
) -> anyhow::Result<Reconstruction> {
    let mut table = load_table(csv, duplicate_policy(strict))?;
    match source {
        Some(source) => {
            let stats = fill_missing_weather(&mut table.readings, source, pause).await;
            info!(
                "Weather requested for {} dates: {} filled, {} failed",
                stats.requested, stats.filled, stats.failed
            );
        }
        None => warn!("No weather API key configured, skipping weather enrichment"),
    }

    let series = reconstruct(table.readings);
    save_series(csv, &series)?;
    log_report(&table.report, &series);
    Ok(Reconstruction {
        series,
        report: table.report,
    })
}

pub async fn run_fetch_weather(
    csv: &str,
    api_key: Option<&str>,
    location: &str,
    max_tries: u32,
    strict: bool,
) -> anyhow::Result<()> {
    let client = match api_key.map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => Some(VisualCrossingClient::new(key, location)?.with_max_tries(max_tries)),
        None => None,
    };
    update_weather(csv, client.as_ref(), REQUEST_PAUSE, strict).await?;
    info!("Weather update complete. Output: {}", csv);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use solar_core::error::{Result, SolarError};
    use solar_core::reading::{DataFlag, Weather};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;

    /// Answers from a fixed map and records which dates were asked for.
    #[derive(Default)]
    struct StubSource {
        days: HashMap<NaiveDate, Weather>,
        calls: RefCell<Vec<NaiveDate>>,
    }

    impl WeatherSource for StubSource {
        async fn fetch_day(&self, date: NaiveDate) -> Result<Weather> {
            self.calls.borrow_mut().push(date);
            self.days
                .get(&date)
                .cloned()
                .ok_or_else(|| SolarError::ResponseParse(format!("no data for {}", date)))
        }
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sunny() -> Weather {
        Weather {
            temp_max_c: Some(21.0),
            temp_min_c: Some(12.0),
            cloud_cover_percent: Some(25.0),
            sun_hours: Some(12.0),
            condition: Some("Clear".to_string()),
        }
    }

    #[tokio::test]
    async fn fill_missing_weather_only_requests_incomplete_rows() {
        let mut complete = Reading::new(day(2025, 6, 1), Some(10.0), DataFlag::Present);
        complete.weather = sunny();
        let mut partial = Reading::new(day(2025, 6, 2), Some(20.0), DataFlag::Present);
        partial.weather.condition = Some("Hazy".to_string());
        let bare = Reading::new(day(2025, 6, 3), None, DataFlag::Missing);
        let mut readings = vec![complete, partial, bare];

        let source = StubSource {
            days: HashMap::from([(day(2025, 6, 2), sunny())]),
            ..StubSource::default()
        };
        let stats = fill_missing_weather(&mut readings, &source, Duration::ZERO).await;

        assert_eq!(
            stats,
            WeatherFillStats {
                requested: 2,
                filled: 1,
                failed: 1
            }
        );
        assert_eq!(*source.calls.borrow(), vec![day(2025, 6, 2), day(2025, 6, 3)]);
        // existing values win over fetched ones
        assert_eq!(readings[1].weather.condition.as_deref(), Some("Hazy"));
        assert_eq!(readings[1].weather.sun_hours, Some(12.0));
        assert!(readings[2].weather.is_empty());
    }

    #[tokio::test]
    async fn update_weather_writes_enriched_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar_readings.csv");
        fs::write(&path, "Date,Cumulative_kWh\n01/06/2025,100\n02/06/2025,108.5\n").unwrap();
        let csv = path.to_string_lossy().into_owned();

        let source = StubSource {
            days: HashMap::from([(day(2025, 6, 1), sunny()), (day(2025, 6, 2), sunny())]),
            ..StubSource::default()
        };
        let result = update_weather(&csv, Some(&source), Duration::ZERO, false)
            .await
            .unwrap();

        let second = &result.series.records[1];
        assert!((second.daily_kwh - 8.5).abs() < 1e-9);
        assert_eq!(second.sun_hours_cloud_adjusted, Some(9.0));

        let text = fs::read_to_string(&csv).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[2],
            "2025-06-02,108.5,present,21.0,12.0,25.0,12.0,Clear,8.5,9.0,measured"
        );
    }

    #[tokio::test]
    async fn update_weather_without_source_still_reconstructs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar_readings.csv");
        fs::write(&path, "Date,Cumulative_kWh\n2025-06-01,100\n2025-06-04,130\n").unwrap();
        let csv = path.to_string_lossy().into_owned();

        let result = update_weather::<StubSource>(&csv, None, Duration::ZERO, false)
            .await
            .unwrap();
        assert_eq!(result.series.len(), 4);
        assert!(result.series.records.iter().all(|r| r.weather.is_empty()));
        assert_eq!(fs::read_to_string(&csv).unwrap().lines().count(), 5);
    }

    #[tokio::test]
    async fn run_fetch_weather_blank_key_skips_network() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("solar_readings.csv");
        fs::write(&path, "Date,Cumulative_kWh\n2025-06-01,100\n").unwrap();
        let csv = path.to_string_lossy().into_owned();

        run_fetch_weather(&csv, Some("  "), "CO5 8TA, UK", 3, false)
            .await
            .unwrap();
        assert_eq!(fs::read_to_string(&csv).unwrap().lines().count(), 2);
    }
}
