//! CLI argument definitions for futret.
//!
//! # Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--period` | `5pm` | Anchor period (5pm, wtd, mtd) |
//! | `--format` | `table` | Output format (table, csv, json) |
//! | `--output` | none | Write CSV to a file instead of printing the table |
//! | `--concurrency` | `4` | Tickers fetched at once |
//! | `--timeout-ms` | `10000` | Per-request timeout in ms |
//! | `--fixture` | none | Serve series from a JSON file instead of Yahoo |
//!
//! # Examples
//!
//! ```bash
//! # Returns since the most recent 5pm Central
//! futret tickers.csv
//!
//! # Week to date, written to a CSV file
//! futret tickers.csv --period wtd -o returns.csv
//!
//! # Month to date as pretty JSON
//! futret tickers.csv --period mtd --format json --pretty
//! ```

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use futret_core::Period;

/// Futures returns since a recurring Central-time anchor.
///
/// Reads tickers from a CSV file, fetches hourly and daily closes for each
/// and prints the return from the period anchor to the latest price.
#[derive(Debug, Parser)]
#[command(
    name = "futret",
    author,
    version,
    about = "Futures returns since 5pm CT, week start or month start"
)]
pub struct Cli {
    /// CSV file with a `ticker` or `symbol` column (else the first column is used).
    #[arg(value_name = "INPUT_CSV")]
    pub input: PathBuf,

    /// Anchor period: 5pm (most recent 17:00 CT), wtd (Monday 00:00 CT) or
    /// mtd (first of month 00:00 CT).
    #[arg(long, default_value = "5pm", value_parser = parse_period)]
    pub period: Period,

    /// Output format for results.
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,

    /// Pretty-print JSON output with indentation.
    #[arg(long, default_value_t = false)]
    pub pretty: bool,

    /// Write results as CSV to this path; the table is not printed.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Maximum tickers fetched concurrently; 1 fetches sequentially.
    #[arg(long, default_value_t = 4)]
    pub concurrency: usize,

    /// Request timeout budget in milliseconds.
    #[arg(long, default_value_t = 10_000)]
    pub timeout_ms: u64,

    /// Lookback requested for hourly bars.
    #[arg(long, default_value = "1mo")]
    pub intraday_range: String,

    /// Lookback requested for daily bars.
    #[arg(long, default_value = "3mo")]
    pub daily_range: String,

    /// Upper bound on chart requests per second.
    #[arg(long, default_value_t = 4)]
    pub requests_per_second: u32,

    /// Serve price series from a JSON fixture file instead of Yahoo.
    #[arg(long, value_name = "PATH")]
    pub fixture: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Fixed-width aligned table.
    Table,
    /// Comma-separated values with a header row.
    Csv,
    /// The full report as a JSON object.
    Json,
}

fn parse_period(value: &str) -> Result<Period, String> {
    value.parse::<Period>().map_err(|error| error.to_string())
}
