//! In-memory SQLite database layer for reconstructed solar generation data.
//!
//! The dashboard views (daily line, monthly bars, last-week bars, month
//! comparison across years, weather overlay) are all simple aggregations
//! over the dense daily series, so the series is loaded into an in-memory
//! SQLite database and exposed through typed query methods.
//!
//! # Usage
//!
//! ```rust
//! use solar_db::Database;
//!
//! let db = Database::new().unwrap();
//! // records normally come from solar_data::reconstruct
//! db.load_daily_records(&[]).unwrap();
//! let months = db.query_monthly_totals().unwrap();
//! assert!(months.is_empty());
//! ```
//!
//! # Tables
//!
//! See [`schema::create_schema`] for the full SQL schema.

pub mod schema;
mod loader;
mod queries;
pub mod models;

use rusqlite::Connection;
use std::cell::RefCell;
use std::rc::Rc;

/// In-memory SQLite database holding one reconstructed daily series.
///
/// Cheaply cloneable (via `Rc`); clones share the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// Create a new in-memory database with the full schema applied.
    pub fn new() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}
