//! Behavior-driven tests for batch runs
//!
//! These tests verify that a batch always yields one row per input ticker,
//! in input order, no matter how individual fetches behave.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futret_core::{
    run_batch, Bar, BatchOptions, CivilZone, FetchFuture, FixedClock, MemorySeriesProvider,
    Period, ProviderError, ReturnsEngine, SeriesPair, SeriesProvider, StartSource, Symbol,
    UtcDateTime,
};

fn at(value: &str) -> UtcDateTime {
    UtcDateTime::parse(value).expect("valid timestamp")
}

fn bar(ts: &str, price: f64) -> Bar {
    Bar::new(at(ts), price).expect("valid bar")
}

fn symbol(value: &str) -> Symbol {
    Symbol::parse(value).expect("valid symbol")
}

fn tickers(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| (*value).to_owned()).collect()
}

/// Monday 2024-03-11 10:00 CDT.
fn monday_morning() -> UtcDateTime {
    at("2024-03-11T15:00:00Z")
}

fn series(name: &str, start: f64, current: f64) -> SeriesPair {
    SeriesPair::new(
        Some(name.to_owned()),
        vec![
            bar("2024-03-08T22:00:00Z", start),
            bar("2024-03-11T14:00:00Z", current),
        ],
        vec![bar("2024-03-07T06:00:00Z", start)],
    )
}

fn futures_provider() -> MemorySeriesProvider {
    MemorySeriesProvider::new()
        .with_series(symbol("ES=F"), series("E-Mini S&P 500", 100.0, 103.78))
        .with_failure(symbol("NQ=F"), ProviderError::unavailable("upstream timeout"))
        .with_series(symbol("CL=F"), series("Crude Oil", 80.0, 79.0))
}

/// Answers after a per-ticker delay so completion order differs from input order.
struct DelayedProvider {
    inner: MemorySeriesProvider,
    delays_ms: BTreeMap<Symbol, u64>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl DelayedProvider {
    fn new(inner: MemorySeriesProvider, delays_ms: &[(&str, u64)]) -> Self {
        Self {
            inner,
            delays_ms: delays_ms
                .iter()
                .map(|(ticker, delay)| (symbol(ticker), *delay))
                .collect(),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    fn peak(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }
}

impl SeriesProvider for DelayedProvider {
    fn name(&self) -> &'static str {
        "delayed"
    }

    fn fetch<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a> {
        Box::pin(async move {
            let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(current, Ordering::SeqCst);

            let delay = self.delays_ms.get(symbol).copied().unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            let outcome = self.inner.fetch(symbol).await;

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            outcome
        })
    }
}

/// Panics while fetching one ticker and delegates every other one.
struct PanickingProvider {
    inner: MemorySeriesProvider,
    panics_on: Symbol,
}

impl SeriesProvider for PanickingProvider {
    fn name(&self) -> &'static str {
        "panicking"
    }

    fn fetch<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a> {
        Box::pin(async move {
            if *symbol == self.panics_on {
                panic!("feed handler crashed on {symbol}");
            }
            self.inner.fetch(symbol).await
        })
    }
}

// =============================================================================
// Batch: failure isolation
// =============================================================================

#[tokio::test]
async fn when_one_ticker_fails_the_others_still_get_rows_in_order() {
    // Given: Three tickers where the middle one fails upstream
    let zone = CivilZone::central().expect("central zone");
    let input = tickers(&["ES=F", "NQ=F", "CL=F"]);

    // When: The batch runs for week to date
    let rows = run_batch(
        &input,
        Period::WeekToDate,
        monday_morning(),
        zone,
        Arc::new(futures_provider()),
        BatchOptions { concurrency: 1 },
    )
    .await;

    // Then: Three rows come back in input order with only the middle one empty
    let order = rows.iter().map(|row| row.ticker.as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["ES=F", "NQ=F", "CL=F"]);

    assert!(!rows[0].is_failure());
    assert!(rows[1].is_failure());
    assert_eq!(rows[1].name, None);
    assert_eq!(rows[1].price_start, None);
    assert_eq!(rows[1].price_current, None);
    assert_eq!(rows[1].return_pct, None);
    assert!(!rows[2].is_failure());

    let crude = rows[2].return_pct.expect("crude return");
    assert!((crude + 1.25).abs() < 1e-9, "return={crude}");
}

#[tokio::test]
async fn when_a_ticker_is_unknown_or_malformed_it_becomes_a_failure_row() {
    // Given: An unknown ticker and a malformed one around a good one
    let zone = CivilZone::central().expect("central zone");
    let input = tickers(&["ZZ=F", "ES=F", "1BAD"]);

    // When: The batch runs
    let rows = run_batch(
        &input,
        Period::FivePm,
        monday_morning(),
        zone,
        Arc::new(futures_provider()),
        BatchOptions::default(),
    )
    .await;

    // Then: Both bad tickers keep their position and carry a failure message
    assert_eq!(rows.len(), 3);
    assert!(rows[0].is_failure());
    assert_eq!(rows[1].ticker, "ES=F");
    assert!(!rows[1].is_failure());
    assert!(rows[2].is_failure());
    assert_eq!(rows[2].ticker, "1BAD");
}

#[tokio::test]
async fn when_a_fetch_panics_only_that_ticker_becomes_a_failure_row() {
    for concurrency in [1, 3] {
        // Given: A provider that panics on NQ=F between two good tickers
        let zone = CivilZone::central().expect("central zone");
        let provider = Arc::new(PanickingProvider {
            inner: futures_provider(),
            panics_on: symbol("NQ=F"),
        });
        let input = tickers(&["ES=F", "NQ=F", "ES=F"]);

        // When: The batch runs
        let rows = run_batch(
            &input,
            Period::FivePm,
            monday_morning(),
            zone,
            provider,
            BatchOptions { concurrency },
        )
        .await;

        // Then: The panicking ticker keeps its slot with every value missing
        let order = rows.iter().map(|row| row.ticker.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["ES=F", "NQ=F", "ES=F"], "concurrency={concurrency}");
        assert_eq!(rows[1].failure.as_deref(), Some("ticker task aborted"));
        assert_eq!(rows[1].name, None);
        assert_eq!(rows[1].price_start, None);
        assert_eq!(rows[1].price_current, None);
        assert_eq!(rows[1].return_pct, None);
        assert_eq!(rows[1].start_source, None);

        // Then: Its neighbours are unaffected
        assert!(!rows[0].is_failure());
        assert!(!rows[2].is_failure());
    }
}

#[tokio::test]
async fn when_a_ticker_repeats_each_row_is_kept() {
    // Given: ES=F listed twice around CL=F
    let zone = CivilZone::central().expect("central zone");
    let input = tickers(&["ES=F", "CL=F", "ES=F"]);

    // When: The batch runs with several workers
    let rows = run_batch(
        &input,
        Period::WeekToDate,
        monday_morning(),
        zone,
        Arc::new(futures_provider()),
        BatchOptions { concurrency: 3 },
    )
    .await;

    // Then: One row per input line, the repeats identical
    let order = rows.iter().map(|row| row.ticker.as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["ES=F", "CL=F", "ES=F"]);
    assert_eq!(rows[0], rows[2]);
    assert_eq!(rows[0].price_start, Some(100.0));
}

#[tokio::test]
async fn when_the_input_is_empty_the_batch_is_empty() {
    let zone = CivilZone::central().expect("central zone");

    let rows = run_batch(
        &[],
        Period::MonthToDate,
        monday_morning(),
        zone,
        Arc::new(futures_provider()),
        BatchOptions::default(),
    )
    .await;

    assert!(rows.is_empty());
}

// =============================================================================
// Batch: concurrency
// =============================================================================

#[tokio::test]
async fn when_fetches_finish_out_of_order_rows_keep_input_order() {
    // Given: The first ticker answers last
    let zone = CivilZone::central().expect("central zone");
    let provider = Arc::new(DelayedProvider::new(
        futures_provider(),
        &[("ES=F", 60), ("NQ=F", 20), ("CL=F", 0)],
    ));
    let input = tickers(&["ES=F", "NQ=F", "CL=F"]);

    // When: The batch runs with three workers
    let rows = run_batch(
        &input,
        Period::WeekToDate,
        monday_morning(),
        zone,
        provider.clone(),
        BatchOptions { concurrency: 3 },
    )
    .await;

    // Then: Rows are still in input order
    let order = rows.iter().map(|row| row.ticker.as_str()).collect::<Vec<_>>();
    assert_eq!(order, vec!["ES=F", "NQ=F", "CL=F"]);
    assert!(rows[1].is_failure());
    assert!(provider.peak() >= 2, "peak={}", provider.peak());
}

#[tokio::test]
async fn when_concurrency_is_capped_no_more_fetches_run_at_once() {
    // Given: Six slow tickers and a cap of two workers
    let zone = CivilZone::central().expect("central zone");
    let names = ["ES=F", "NQ=F", "CL=F", "GC=F", "ZN=F", "HG=F"];
    let delays = names.iter().map(|name| (*name, 15)).collect::<Vec<_>>();
    let provider = Arc::new(DelayedProvider::new(futures_provider(), &delays));

    // When: The batch runs
    let rows = run_batch(
        &tickers(&names),
        Period::FivePm,
        monday_morning(),
        zone,
        provider.clone(),
        BatchOptions { concurrency: 2 },
    )
    .await;

    // Then: Every ticker has a row and the cap held
    assert_eq!(rows.len(), names.len());
    assert!(provider.peak() <= 2, "peak={}", provider.peak());
}

// =============================================================================
// Batch: engine
// =============================================================================

#[tokio::test]
async fn when_the_engine_runs_twice_on_the_same_clock_the_rows_match() {
    // Given: An engine pinned to Monday morning
    let engine = ReturnsEngine::new(Arc::new(futures_provider()))
        .expect("central zone")
        .with_clock(Arc::new(FixedClock::new(monday_morning())))
        .with_options(BatchOptions { concurrency: 2 });
    let input = tickers(&["ES=F", "NQ=F", "CL=F"]);

    // When: The same request is run twice
    let first = engine.run(&input, Period::WeekToDate).await;
    let second = engine.run(&input, Period::WeekToDate).await;

    // Then: Rows and anchor are identical, only the run id differs
    assert_eq!(first.rows, second.rows);
    assert_eq!(first.anchor, second.anchor);
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(first.anchor, at("2024-03-11T05:00:00Z"));
    assert_eq!(first.rows[0].start_source, Some(StartSource::Intraday));
}

#[tokio::test]
async fn when_every_ticker_fails_the_report_says_so() {
    // Given: Tickers the provider does not know
    let engine = ReturnsEngine::new(Arc::new(MemorySeriesProvider::new()))
        .expect("central zone")
        .with_clock(Arc::new(FixedClock::new(monday_morning())));

    // When: The engine runs
    let report = engine.run(&tickers(&["ES=F", "NQ=F"]), Period::FivePm).await;

    // Then: Every row failed
    assert_eq!(report.failure_count(), 2);
    assert!(report.all_failed());
}
