/// Error types for the solar core library
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for solar table and weather operations
#[derive(Error, Debug)]
pub enum SolarError {
    /// A row's date could not be parsed or is not a real calendar date
    #[error("line {line}: invalid date {value:?}: {reason}")]
    InvalidDate {
        line: u64,
        value: String,
        reason: String,
    },

    /// A row's cumulative reading is non-numeric or negative
    #[error("line {line}: invalid cumulative reading {value:?}: {reason}")]
    InvalidReading {
        line: u64,
        value: String,
        reason: String,
    },

    /// A row's bytes are not valid UTF-8
    #[error("line {line}: undecodable row: {reason}")]
    InvalidEncoding { line: u64, reason: String },

    /// More than one row for the same date under the strict policy
    #[error("duplicate reading for {0}")]
    DuplicateDate(NaiveDate),

    /// Failed to read or write CSV data
    #[error("Failed to parse CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[cfg(feature = "api")]
    #[error("HTTP request failed: {0}")]
    HttpRequest(#[from] reqwest::Error),

    /// Failed to parse a weather API response
    #[error("Failed to parse weather response: {0}")]
    ResponseParse(String),
}

impl SolarError {
    /// True for the row-level errors that cleaning recovers from by
    /// dropping the row.
    pub fn is_row_error(&self) -> bool {
        matches!(
            self,
            SolarError::InvalidDate { .. }
                | SolarError::InvalidReading { .. }
                | SolarError::InvalidEncoding { .. }
        )
    }
}

/// Type alias for Results using SolarError
pub type Result<T> = std::result::Result<T, SolarError>;
