//! Batch orchestration: one output row per input ticker, in input order.
//!
//! Per-ticker failures (invalid ticker, provider error, aborted task) become
//! failure rows. Nothing a single ticker does can abort the batch.

use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::anchor::{anchor_instant, CivilZone};
use crate::clock::{Clock, SystemClock};
use crate::provider::SeriesProvider;
use crate::resolve::resolve_prices;
use crate::returns::percent_return;
use crate::{ContractResult, CoreError, Period, ReturnsReport, SeriesPair, Symbol, UtcDateTime};

/// Batch execution knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum tickers fetched at once; `1` fetches one after another.
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Compute one row per ticker for `period` as seen at `now`.
pub async fn run_batch(
    tickers: &[String],
    period: Period,
    now: UtcDateTime,
    zone: CivilZone,
    provider: Arc<dyn SeriesProvider>,
    options: BatchOptions,
) -> Vec<ContractResult> {
    let anchor = anchor_instant(period, now, &zone);
    resolve_batch(tickers, anchor, zone, provider, options).await
}

/// Build the output row for an already fetched series.
pub fn contract_result(
    ticker: &str,
    series: &SeriesPair,
    anchor: UtcDateTime,
    zone: &CivilZone,
) -> ContractResult {
    let resolved = resolve_prices(series, anchor, zone);
    tracing::debug!(
        ticker,
        source = ?resolved.start_source,
        intraday_bars = series.intraday.len(),
        daily_bars = series.daily.len(),
        "resolved start price"
    );

    ContractResult {
        ticker: ticker.to_owned(),
        name: series.name.clone(),
        price_start: resolved.price_start,
        price_current: resolved.price_current,
        return_pct: percent_return(resolved.price_start, resolved.price_current),
        start_source: resolved.start_source,
        failure: None,
    }
}

async fn resolve_batch(
    tickers: &[String],
    anchor: UtcDateTime,
    zone: CivilZone,
    provider: Arc<dyn SeriesProvider>,
    options: BatchOptions,
) -> Vec<ContractResult> {
    // Every ticker runs in its own task, even at concurrency 1, so a panicking
    // fetch costs one row instead of the batch.
    let permits = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for (index, ticker) in tickers.iter().enumerate() {
        let ticker = ticker.clone();
        let provider = Arc::clone(&provider);
        let permits = Arc::clone(&permits);
        tasks.spawn(async move {
            let _permit = permits.acquire_owned().await.ok();
            let row = evaluate_ticker(&ticker, anchor, &zone, provider.as_ref()).await;
            (index, row)
        });
    }

    let mut rows: Vec<Option<ContractResult>> = vec![None; tickers.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, row)) => rows[index] = Some(row),
            Err(error) => tracing::warn!(%error, "ticker task aborted"),
        }
    }

    rows.into_iter()
        .zip(tickers)
        .map(|(row, ticker)| {
            row.unwrap_or_else(|| ContractResult::failed(ticker.trim(), "ticker task aborted"))
        })
        .collect()
}

async fn evaluate_ticker(
    ticker: &str,
    anchor: UtcDateTime,
    zone: &CivilZone,
    provider: &dyn SeriesProvider,
) -> ContractResult {
    let ticker = ticker.trim();
    let symbol = match Symbol::parse(ticker) {
        Ok(symbol) => symbol,
        Err(error) => {
            tracing::warn!(ticker, %error, "skipping invalid ticker");
            return ContractResult::failed(ticker, error.to_string());
        }
    };

    match provider.fetch(&symbol).await {
        Ok(series) => contract_result(ticker, &series, anchor, zone),
        Err(error) => {
            tracing::warn!(
                ticker,
                provider = provider.name(),
                code = error.code(),
                %error,
                "price series fetch failed"
            );
            ContractResult::failed(ticker, error.to_string())
        }
    }
}

/// Zone, clock, provider and options bundled for repeated runs.
#[derive(Clone)]
pub struct ReturnsEngine {
    zone: CivilZone,
    clock: Arc<dyn Clock>,
    provider: Arc<dyn SeriesProvider>,
    options: BatchOptions,
}

impl ReturnsEngine {
    /// Engine on the system clock in America/Chicago.
    ///
    /// # Errors
    ///
    /// Fails when the timezone database cannot resolve America/Chicago.
    pub fn new(provider: Arc<dyn SeriesProvider>) -> Result<Self, CoreError> {
        Ok(Self {
            zone: CivilZone::central()?,
            clock: Arc::new(SystemClock),
            provider,
            options: BatchOptions::default(),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_zone(mut self, zone: CivilZone) -> Self {
        self.zone = zone;
        self
    }

    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn zone(&self) -> CivilZone {
        self.zone
    }

    /// Read the clock once, anchor `period`, and compute every ticker.
    pub async fn run(&self, tickers: &[String], period: Period) -> ReturnsReport {
        let now = self.clock.now();
        let anchor = anchor_instant(period, now, &self.zone);
        let run_id = Uuid::new_v4();
        tracing::info!(
            %run_id,
            %period,
            %anchor,
            zone = self.zone.name(),
            provider = self.provider.name(),
            tickers = tickers.len(),
            "starting returns run"
        );

        let rows = resolve_batch(
            tickers,
            anchor,
            self.zone,
            Arc::clone(&self.provider),
            self.options,
        )
        .await;

        let report = ReturnsReport {
            run_id,
            period,
            anchor,
            generated_at: now,
            rows,
        };
        tracing::info!(
            %run_id,
            rows = report.rows.len(),
            failures = report.failure_count(),
            "finished returns run"
        );
        report
    }
}
