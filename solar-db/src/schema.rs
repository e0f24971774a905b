//! SQL schema for the in-memory database.

/// Returns the full SQL schema as a single batch string.
///
/// `daily_generation` holds one row per calendar day of a reconstructed
/// series. Dates are stored as `YYYY-MM-DD` text so that lexical order is
/// chronological and `substr` can pull out year and month.
pub fn create_schema() -> &'static str {
    r#"
    CREATE TABLE IF NOT EXISTS daily_generation (
        date TEXT PRIMARY KEY,
        cumulative_kwh REAL,
        data_flag TEXT,
        daily_kwh REAL NOT NULL,
        fill_method TEXT NOT NULL,
        temp_max_c REAL,
        temp_min_c REAL,
        cloud_cover_percent REAL,
        sun_hours REAL,
        condition TEXT,
        sun_hours_cloud_adjusted REAL
    );
    CREATE INDEX IF NOT EXISTS idx_daily_month ON daily_generation(substr(date, 1, 7));
    "#
}
