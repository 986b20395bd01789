//! # futret core
//!
//! Returns of futures contracts since a recurring reference point in time:
//! the most recent 5pm Central, the start of the week, or the start of the
//! month.
//!
//! ## Pipeline
//!
//! ```text
//! tickers ──▶ SeriesProvider::fetch ──▶ resolve_prices(anchor) ──▶ percent_return
//!                                            ▲
//!              Clock::now ──▶ anchor_instant(period, now, zone)
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`anchor`] | Civil-timezone anchors for each [`Period`] |
//! | [`resolve`] | Start/current price lookup with daily fallback |
//! | [`returns`] | Percentage return with explicit missing values |
//! | [`batch`] | Ordered, failure-isolating batch runner |
//! | [`provider`] | Series provider contract and in-memory fixtures |
//! | [`adapters`] | Yahoo Finance chart provider |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`retry`] | Backoff and request pacing |
//! | [`clock`] | Injectable clock |
//! | [`domain`] | Domain models |
//! | [`error`] | Core error types |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use futret_core::{Period, ReturnsEngine, YahooChartProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), futret_core::CoreError> {
//!     let engine = ReturnsEngine::new(Arc::new(YahooChartProvider::default()))?;
//!     let tickers = vec![String::from("ES=F"), String::from("CL=F")];
//!     let report = engine.run(&tickers, Period::FivePm).await;
//!     for row in &report.rows {
//!         println!("{} {:?}", row.ticker, row.return_pct);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Error Handling
//!
//! Structural failures (unknown timezone, invalid period, unreadable
//! fixtures) are [`CoreError`] values raised before any ticker is fetched.
//! Per-ticker failures never escape the batch: they are recorded on the
//! row as missing prices plus a `failure` message.

pub mod adapters;
pub mod anchor;
pub mod batch;
pub mod clock;
pub mod domain;
pub mod error;
pub mod http_client;
pub mod provider;
pub mod resolve;
pub mod retry;
pub mod returns;

pub use adapters::{YahooChartProvider, YahooConfig};

pub use anchor::{anchor_instant, start_of_local_day, CivilZone, CENTRAL_ZONE};

pub use batch::{contract_result, run_batch, BatchOptions, ReturnsEngine};

pub use clock::{Clock, FixedClock, SystemClock};

pub use domain::{
    Bar, ContractResult, Interval, Period, PriceSeries, ReturnsReport, SeriesPair, StartSource,
    Symbol, UtcDateTime,
};

pub use error::{CoreError, ValidationError};

pub use http_client::{HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient};

pub use provider::{
    FetchFuture, MemorySeriesProvider, ProviderError, ProviderErrorKind, SeriesProvider,
};

pub use resolve::{resolve_prices, ResolvedPrices};

pub use retry::{Backoff, RequestPacer, RetryPolicy};

pub use returns::percent_return;
