use std::io::{self, Write};
use std::path::Path;

use futret_core::{ContractResult, Period, ReturnsReport};

use crate::cli::OutputFormat;
use crate::error::CliError;

const MISSING: &str = "NaN";

/// Print `report` to stdout in `format`.
///
/// When `output` is set, CSV is also written there and the table view is
/// not printed.
pub fn render(
    report: &ReturnsReport,
    format: OutputFormat,
    pretty: bool,
    output: Option<&Path>,
) -> Result<(), CliError> {
    if let Some(path) = output {
        let mut writer = csv::Writer::from_path(path)?;
        write_csv(report, &mut writer)?;
        writer.flush()?;
        eprintln!("Wrote {} rows to {}", report.rows.len(), path.display());
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    match format {
        OutputFormat::Table if output.is_some() => {}
        OutputFormat::Table => writeln!(stdout, "{}", render_table(report))?,
        OutputFormat::Csv => {
            let mut writer = csv::Writer::from_writer(&mut stdout);
            write_csv(report, &mut writer)?;
            writer.flush()?;
        }
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(report)?
            } else {
                serde_json::to_string(report)?
            };
            writeln!(stdout, "{payload}")?;
        }
    }

    Ok(())
}

pub fn headers(period: Period) -> [String; 5] {
    let suffix = period.column_suffix();
    [
        String::from("ticker"),
        String::from("name"),
        format!("price_{suffix}"),
        String::from("price_current"),
        format!("return_since_{suffix}"),
    ]
}

pub fn format_price(value: Option<f64>) -> String {
    match two_decimals(value) {
        Some(price) => price,
        None => String::from(MISSING),
    }
}

pub fn format_return(value: Option<f64>) -> String {
    match two_decimals(value) {
        Some(pct) => format!("{pct}%"),
        None => String::from(MISSING),
    }
}

/// Finite values rounded to two places; anything that rounds to zero prints unsigned.
fn two_decimals(value: Option<f64>) -> Option<String> {
    let value = value.filter(|value| value.is_finite())?;
    let text = format!("{value:.2}");
    match text.strip_prefix('-') {
        Some(unsigned) if unsigned.bytes().all(|b| b == b'0' || b == b'.') => {
            Some(unsigned.to_owned())
        }
        _ => Some(text),
    }
}

fn display_row(row: &ContractResult) -> [String; 5] {
    [
        row.ticker.clone(),
        row.name.clone().unwrap_or_else(|| row.ticker.clone()),
        format_price(row.price_start),
        format_price(row.price_current),
        format_return(row.return_pct),
    ]
}

fn write_csv<W: Write>(report: &ReturnsReport, writer: &mut csv::Writer<W>) -> Result<(), CliError> {
    writer.write_record(headers(report.period))?;
    for row in &report.rows {
        writer.write_record(display_row(row))?;
    }
    Ok(())
}

/// Fixed-width table: text columns left-aligned, numbers right-aligned.
pub fn render_table(report: &ReturnsReport) -> String {
    let headers = headers(report.period);
    let rows = report.rows.iter().map(display_row).collect::<Vec<_>>();

    let mut widths = headers.iter().map(|h| h.chars().count()).collect::<Vec<_>>();
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(align_line(&headers, &widths));
    lines.push(
        widths
            .iter()
            .map(|width| "-".repeat(*width))
            .collect::<Vec<_>>()
            .join("  "),
    );
    for row in &rows {
        lines.push(align_line(row, &widths));
    }
    lines.join("\n")
}

fn align_line(cells: &[String; 5], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .enumerate()
        .map(|(column, (cell, &width))| {
            if column < 2 {
                format!("{cell:<width$}")
            } else {
                format!("{cell:>width$}")
            }
        })
        .collect::<Vec<_>>()
        .join("  ")
}
