mod provider;

use futret_core::{BatchOptions, ReturnsEngine, ReturnsReport};

use crate::cli::Cli;
use crate::error::CliError;
use crate::input::read_tickers;

/// Load tickers, run the engine and return the report.
///
/// Configuration problems fail here before any ticker is fetched.
pub async fn run(cli: &Cli) -> Result<ReturnsReport, CliError> {
    let tickers = read_tickers(&cli.input)?;
    let provider = provider::build(cli)?;

    let engine = ReturnsEngine::new(provider)?.with_options(BatchOptions {
        concurrency: cli.concurrency.max(1),
    });

    let report = engine.run(&tickers, cli.period).await;
    for row in report.rows.iter().filter(|row| row.is_failure()) {
        tracing::info!(
            ticker = %row.ticker,
            reason = row.failure.as_deref().unwrap_or_default(),
            "ticker has no prices"
        );
    }
    Ok(report)
}
