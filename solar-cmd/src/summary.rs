//! Dashboard summary printed to stdout.

use crate::persist::{duplicate_policy, load_table, log_report};
use chrono::Datelike;
use solar_data::rolling::trailing_mean;
use solar_data::{reconstruct, DailySeries};
use solar_db::models::{DateValue, FillCount, MonthTotal, YearDayValue};
use solar_db::Database;
use std::io::{self, Write};

/// Days in the trailing mean used to smooth the month comparison.
pub const SMOOTHING_WINDOW: usize = 3;

/// One year's run of a calendar month, with its smoothed line.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthComparison {
    pub year: i32,
    pub days: Vec<YearDayValue>,
    pub smoothed: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub date_range: Option<(String, String)>,
    pub total_kwh: f64,
    pub negative_deltas: usize,
    pub fill_counts: Vec<FillCount>,
    pub monthly: Vec<MonthTotal>,
    pub recent: Vec<DateValue>,
    pub month: Option<u32>,
    pub comparison: Vec<MonthComparison>,
}

/// Load `series` into a database and run the dashboard queries.
///
/// `month` defaults to the month of the last date in the series.
pub fn build_summary(
    series: &DailySeries,
    last_days: usize,
    month: Option<u32>,
) -> anyhow::Result<Summary> {
    let db = Database::new()?;
    db.load_daily_records(&series.records)?;

    let month = month.or_else(|| series.last_date().map(|d| d.month()));
    let comparison = match month {
        Some(month) => compare_month(db.query_month_by_year(month)?),
        None => Vec::new(),
    };

    Ok(Summary {
        date_range: db.query_date_range()?,
        total_kwh: series.total_kwh(),
        negative_deltas: series.negative_deltas,
        fill_counts: db.query_fill_counts()?,
        monthly: db.query_monthly_totals()?,
        recent: db.query_last_n_days(last_days)?,
        month,
        comparison,
    })
}

fn compare_month(rows: Vec<YearDayValue>) -> Vec<MonthComparison> {
    rows.chunk_by(|a, b| a.year == b.year)
        .map(|days| {
            let values: Vec<f64> = days.iter().map(|d| d.value).collect();
            MonthComparison {
                year: days[0].year,
                days: days.to_vec(),
                smoothed: trailing_mean(&values, SMOOTHING_WINDOW),
            }
        })
        .collect()
}

pub fn print_summary<W: Write>(summary: &Summary, out: &mut W) -> io::Result<()> {
    let Some((first, last)) = &summary.date_range else {
        writeln!(out, "No readings.")?;
        return Ok(());
    };
    writeln!(
        out,
        "Generation {} to {}: {:.1} kWh",
        first, last, summary.total_kwh
    )?;
    if summary.negative_deltas > 0 {
        writeln!(
            out,
            "Warning: {} negative cumulative deltas clamped to 0",
            summary.negative_deltas
        )?;
    }
    let fills: Vec<String> = summary
        .fill_counts
        .iter()
        .map(|f| format!("{} {}", f.fill_method, f.days))
        .collect();
    writeln!(out, "Days by fill method: {}", fills.join(", "))?;

    writeln!(out, "\nMonthly totals")?;
    for m in &summary.monthly {
        writeln!(out, "  {}  {:>8.1} kWh  ({} days)", m.month, m.total_kwh, m.days)?;
    }

    writeln!(out, "\nLast {} days", summary.recent.len())?;
    for d in &summary.recent {
        writeln!(out, "  {}  {:>6.1} kWh", d.date, d.value)?;
    }

    if let Some(month) = summary.month {
        writeln!(
            out,
            "\nMonth {:02} by year ({}-day rolling mean)",
            month, SMOOTHING_WINDOW
        )?;
        for year in &summary.comparison {
            let line: Vec<String> = year
                .days
                .iter()
                .zip(&year.smoothed)
                .map(|(d, s)| match s {
                    Some(mean) => format!("{}:{:.1}", d.day, mean),
                    None => format!("{}:-", d.day),
                })
                .collect();
            writeln!(out, "  {}  {}", year.year, line.join(" "))?;
        }
    }
    Ok(())
}

pub fn run_summary(csv: &str, last_days: usize, month: Option<u32>) -> anyhow::Result<()> {
    let table = load_table(csv, duplicate_policy(false))?;
    let series = reconstruct(table.readings);
    log_report(&table.report, &series);

    let summary = build_summary(&series, last_days, month)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    print_summary(&summary, &mut out)?;
    Ok(())
}
