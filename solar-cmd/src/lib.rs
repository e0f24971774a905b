//! Command implementations for the solar CLI.
//!
//! Provides subcommands that rebuild the daily generation columns of the
//! readings table, enrich it with weather, record a new meter reading and
//! print dashboard summaries.

use clap::Subcommand;
use solar_core::weather::DEFAULT_LOCATION;

pub mod persist;
pub mod record;
pub mod summary;
pub mod update;
pub mod weather;

/// Default location of the readings table.
pub const DEFAULT_CSV_PATH: &str = "data/solar_readings.csv";

#[derive(Subcommand)]
pub enum Command {
    /// Recompute daily generation for every date and rewrite the table
    UpdateDaily {
        /// Path to the readings CSV (rewritten in place)
        #[arg(short = 'c', long, default_value = DEFAULT_CSV_PATH)]
        csv: String,

        /// Fail on duplicate dates instead of keeping the last row
        #[arg(long)]
        strict: bool,
    },

    /// Fill missing weather columns from Visual Crossing, then recompute
    FetchWeather {
        /// Path to the readings CSV (rewritten in place)
        #[arg(short = 'c', long, default_value = DEFAULT_CSV_PATH)]
        csv: String,

        /// Location passed to the weather API
        #[arg(long, env = "SOLAR_LOCATION", default_value = DEFAULT_LOCATION)]
        location: String,

        /// Visual Crossing API key; enrichment is skipped without one
        #[arg(long, env = "VISUAL_CROSSING_API_KEY", hide_env_values = true)]
        api_key: Option<String>,

        /// Attempts per date before giving up on it
        #[arg(long, default_value_t = 3)]
        max_tries: u32,

        /// Fail on duplicate dates instead of keeping the last row
        #[arg(long)]
        strict: bool,
    },

    /// Save a cumulative meter reading and recompute
    Record {
        /// Path to the readings CSV (rewritten in place)
        #[arg(short = 'c', long, default_value = DEFAULT_CSV_PATH)]
        csv: String,

        /// Cumulative meter reading in kWh
        #[arg(long)]
        kwh: f64,

        /// Date of the reading (YYYY-MM-DD or DD/MM/YYYY), defaults to today
        #[arg(short = 'd', long)]
        date: Option<String>,
    },

    /// Print monthly totals, recent days and a month compared across years
    Summary {
        /// Path to the readings CSV
        #[arg(short = 'c', long, default_value = DEFAULT_CSV_PATH)]
        csv: String,

        /// How many recent days to list
        #[arg(long, default_value_t = 7)]
        last_days: usize,

        /// Calendar month (1-12) to compare across years, defaults to the
        /// month of the latest date
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=12))]
        month: Option<u32>,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::UpdateDaily { csv, strict } => {
            update::run_update_daily(&csv, strict)?;
            Ok(())
        }
        Command::FetchWeather {
            csv,
            location,
            api_key,
            max_tries,
            strict,
        } => {
            weather::run_fetch_weather(&csv, api_key.as_deref(), &location, max_tries, strict)
                .await
        }
        Command::Record { csv, kwh, date } => {
            record::run_record(&csv, kwh, date.as_deref())?;
            Ok(())
        }
        Command::Summary {
            csv,
            last_days,
            month,
        } => summary::run_summary(&csv, last_days, month),
    }
}
