//! Core types for solar generation data: meter readings, the dense daily
//! record produced by reconstruction, the flat CSV table they live in, and
//! the weather enrichment client.

pub mod daily;
pub mod date_range;
pub mod error;
pub mod reading;
pub mod table;
pub mod weather;
