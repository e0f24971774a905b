//! Shared utility functions for solar toolkit crates.

/// Date utility functions
pub mod dates {
    use crate::error::DateError;
    use chrono::NaiveDate;

    /// Canonical table date format: "YYYY-MM-DD"
    pub const ISO_FORMAT: &str = "%Y-%m-%d";

    /// Locale day-first format used by hand-edited tables: "DD/MM/YYYY"
    pub const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_FORMAT).to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), ISO_FORMAT)?)
    }

    /// Parse a date string in "DD/MM/YYYY" format
    pub fn parse_date_day_first(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), DAY_FIRST_FORMAT)?)
    }

    /// Parse a table date written either day-first ("DD/MM/YYYY") or
    /// year-first ("YYYY-MM-DD").
    ///
    /// The separator decides the format, so "03/04/2025" is always the
    /// 3rd of April and never the 4th of March. Impossible calendar dates
    /// such as "31/02/2025" are rejected.
    pub fn parse_table_date(s: &str) -> Result<NaiveDate, DateError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DateError("empty date".to_string()));
        }
        let parsed = if trimmed.contains('/') {
            parse_date_day_first(trimmed)
        } else {
            parse_date(trimmed)
        };
        parsed.map_err(|e| DateError(format!("{trimmed:?}: {e}")))
    }

}

/// Numeric helpers
pub mod numbers {
    /// Round to one decimal place, half away from zero.
    pub fn round_tenth(value: f64) -> f64 {
        (value * 10.0).round() / 10.0
    }

    /// Parse an optional numeric table cell. Empty cells are `None`;
    /// anything else must be a finite number.
    pub fn parse_cell(s: &str) -> Result<Option<f64>, String> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
            return Ok(None);
        }
        match trimmed.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(Some(v)),
            Ok(_) => Err(format!("non-finite value {trimmed:?}")),
            Err(e) => Err(format!("{trimmed:?}: {e}")),
        }
    }

}

/// Error types
pub mod error {
    use std::fmt;

    #[derive(Debug, Clone, PartialEq)]
    pub struct DateError(pub String);

    impl fmt::Display for DateError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "Date error: {}", self.0)
        }
    }

    impl std::error::Error for DateError {}
}
