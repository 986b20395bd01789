//! Ticker list loading.

use std::path::Path;

use csv::ReaderBuilder;

use crate::error::CliError;

const TICKER_COLUMNS: [&str; 4] = ["ticker", "symbol", "Ticker", "Symbol"];

/// Read tickers from a CSV file with a header row.
///
/// Uses the first of `ticker`, `symbol`, `Ticker`, `Symbol` present in the
/// header, else the first column. Values are trimmed and empty cells
/// skipped; duplicates and input order are kept.
pub fn read_tickers(path: &Path) -> Result<Vec<String>, CliError> {
    if !path.is_file() {
        return Err(CliError::InputNotFound(path.display().to_string()));
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;

    let headers = reader.headers()?.clone();
    let column = TICKER_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|header| header == *name))
        .unwrap_or(0);

    let mut tickers = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(value) = record.get(column).map(str::trim) {
            if !value.is_empty() {
                tickers.push(value.to_owned());
            }
        }
    }

    if tickers.is_empty() {
        return Err(CliError::NoTickers(path.display().to_string()));
    }

    tracing::debug!(path = %path.display(), column, count = tickers.len(), "loaded tickers");
    Ok(tickers)
}
