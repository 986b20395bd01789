use std::sync::Arc;

use futret_core::{MemorySeriesProvider, SeriesProvider, YahooChartProvider, YahooConfig};

use crate::cli::Cli;
use crate::error::CliError;

/// Offline fixture provider when `--fixture` is given, Yahoo otherwise.
pub fn build(cli: &Cli) -> Result<Arc<dyn SeriesProvider>, CliError> {
    if let Some(path) = &cli.fixture {
        let provider = MemorySeriesProvider::from_json_file(path)?;
        tracing::info!(path = %path.display(), tickers = provider.len(), "using fixture provider");
        return Ok(Arc::new(provider));
    }

    Ok(Arc::new(YahooChartProvider::new(yahoo_config(cli))))
}

fn yahoo_config(cli: &Cli) -> YahooConfig {
    YahooConfig {
        intraday_range: cli.intraday_range.clone(),
        daily_range: cli.daily_range.clone(),
        timeout_ms: cli.timeout_ms,
        requests_per_second: cli.requests_per_second,
        ..YahooConfig::default()
    }
}
