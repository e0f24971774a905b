//! The flat solar readings table: one CSV row per date.
//!
//! # CSV Format
//!
//! ```text
//! Date,Cumulative_kWh,Data_Flag,Temp_Max_C,Temp_Min_C,CloudCover_Percent,Sun_Hours,Condition,Daily_kWh,Sun_Hours_Cloud_Adjusted,Fill_Method
//! 2025-01-01,100.0,present,8.1,2.3,87.5,1.2,Overcast,0.0,0.2,start
//! ```
//!
//! Only `Date` is required on read. Dates may be day-first (`DD/MM/YYYY`)
//! or year-first (`YYYY-MM-DD`); they are always written year-first. The
//! derived columns (`Daily_kWh`, `Sun_Hours_Cloud_Adjusted`, `Fill_Method`)
//! are ignored on read and recomputed on every run.

use crate::daily::DailyRecord;
use crate::error::{Result, SolarError};
use log::info;
use serde::{Deserialize, Serialize};
use solar_utils::dates::format_date;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Column order of the written table.
pub const COLUMNS: [&str; 11] = [
    "Date",
    "Cumulative_kWh",
    "Data_Flag",
    "Temp_Max_C",
    "Temp_Min_C",
    "CloudCover_Percent",
    "Sun_Hours",
    "Condition",
    "Daily_kWh",
    "Sun_Hours_Cloud_Adjusted",
    "Fill_Method",
];

/// A table row as found on disk, before any validation.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRow {
    /// 1-based line number in the source, for error reports
    #[serde(skip)]
    pub line: u64,
    #[serde(rename = "Date")]
    pub date: String,
    #[serde(rename = "Cumulative_kWh", default)]
    pub cumulative_kwh: Option<String>,
    #[serde(rename = "Data_Flag", default)]
    pub data_flag: Option<String>,
    #[serde(rename = "Temp_Max_C", default)]
    pub temp_max_c: Option<String>,
    #[serde(rename = "Temp_Min_C", default)]
    pub temp_min_c: Option<String>,
    #[serde(rename = "CloudCover_Percent", default)]
    pub cloud_cover_percent: Option<String>,
    #[serde(rename = "Sun_Hours", default)]
    pub sun_hours: Option<String>,
    #[serde(rename = "Condition", default)]
    pub condition: Option<String>,
    /// Set when the row's bytes are not valid UTF-8; the cells are then
    /// empty apart from a lossy `date`.
    #[serde(skip)]
    pub encoding_error: Option<String>,
}

#[derive(Serialize)]
struct TableRow<'a> {
    date: String,
    cumulative_kwh: Option<f64>,
    data_flag: &'a str,
    temp_max_c: Option<f64>,
    temp_min_c: Option<f64>,
    cloud_cover_percent: Option<f64>,
    sun_hours: Option<f64>,
    condition: Option<&'a str>,
    daily_kwh: f64,
    sun_hours_cloud_adjusted: Option<f64>,
    fill_method: &'a str,
}

impl<'a> From<&'a DailyRecord> for TableRow<'a> {
    fn from(record: &'a DailyRecord) -> Self {
        TableRow {
            date: format_date(&record.date),
            cumulative_kwh: record.cumulative_kwh,
            data_flag: record.data_flag.as_ref().map_or("", |f| f.as_str()),
            temp_max_c: record.weather.temp_max_c,
            temp_min_c: record.weather.temp_min_c,
            cloud_cover_percent: record.weather.cloud_cover_percent,
            sun_hours: record.weather.sun_hours,
            condition: record.weather.condition.as_deref(),
            daily_kwh: record.daily_kwh,
            sun_hours_cloud_adjusted: record.sun_hours_cloud_adjusted,
            fill_method: record.fill.as_str(),
        }
    }
}

fn read_rows<R: io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<RawRow>> {
    let headers = rdr.headers()?.clone();
    let date_column = headers.iter().position(|h| h == "Date");
    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let mut row: RawRow = match csv::StringRecord::from_byte_record(record) {
            Ok(record) => record.deserialize(Some(&headers))?,
            Err(e) => {
                let reason = e.utf8_error().to_string();
                let record = e.into_byte_record();
                let date = date_column
                    .and_then(|i| record.get(i))
                    .map(|cell| String::from_utf8_lossy(cell).into_owned())
                    .unwrap_or_default();
                RawRow {
                    date,
                    encoding_error: Some(reason),
                    ..RawRow::default()
                }
            }
        };
        row.line = line;
        rows.push(row);
    }
    Ok(rows)
}

fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers);
    builder
}

/// Parse a table from an in-memory CSV string.
pub fn parse_table(csv_data: &str) -> Result<Vec<RawRow>> {
    read_rows(reader_builder().from_reader(csv_data.as_bytes()))
}

/// Read the whole table from disk. A missing file is an empty table.
pub fn read_table(path: &Path) -> Result<Vec<RawRow>> {
    if !path.exists() {
        info!("{} does not exist yet, starting from an empty table", path.display());
        return Ok(Vec::new());
    }
    let rows = read_rows(reader_builder().from_path(path)?)?;
    info!("Read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Serialize records, header first, to any writer.
pub fn write_table_to<W: io::Write>(writer: W, records: &[DailyRecord]) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(COLUMNS)?;
    for record in records {
        wtr.serialize(TableRow::from(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Sibling path the table is staged in before it replaces the live table.
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Replace the table at `path` with `records`.
///
/// The rows are written to a staging file next to the target and renamed
/// over it, so an interrupted run leaves the previous table intact.
pub fn write_table(path: &Path, records: &[DailyRecord]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let temp_path = staging_path(path);
    let staged = fs::File::create(&temp_path)
        .map_err(SolarError::from)
        .and_then(|file| write_table_to(io::BufWriter::new(file), records));
    if let Err(e) = staged {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }
    fs::rename(&temp_path, path)?;

    info!("Wrote {} rows to {}", records.len(), path.display());
    Ok(())
}
