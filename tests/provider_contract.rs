//! Contract tests every `SeriesProvider` must satisfy
//!
//! The Yahoo adapter is driven through a stub transport so these tests never
//! touch the network.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futret_core::http_client::HttpFuture;
use futret_core::{
    anchor_instant, resolve_prices, CivilZone, HttpClient, HttpError, HttpRequest, HttpResponse,
    MemorySeriesProvider, Period, ProviderErrorKind, RetryPolicy, SeriesProvider, StartSource,
    Symbol, UtcDateTime, YahooChartProvider, YahooConfig,
};

const HOURLY_BODY: &str = r#"{"chart":{"result":[{
    "meta":{"symbol":"ES=F","shortName":"E-Mini S&P 500 Jun 24"},
    "timestamp":[1709935200,1709938800],
    "indicators":{"quote":[{"close":[5150.25,5151.0]}]}
}],"error":null}}"#;

const DAILY_BODY: &str = r#"{"chart":{"result":[{
    "meta":{"symbol":"ES=F","longName":"E-Mini S&P 500 Futures"},
    "timestamp":[1709704800,1709791200,1709877600],
    "indicators":{"quote":[{"close":[5100.0,null,5140.5]}]}
}],"error":null}}"#;

/// Daily labels at midnight New York time: Fri 03-08 (EST), Mon 03-11 and Tue 03-12 (EDT).
const EXCHANGE_MIDNIGHT_DAILY_BODY: &str = r#"{"chart":{"result":[{
    "meta":{"symbol":"ES=F","exchangeTimezoneName":"America/New_York","gmtoffset":-14400},
    "timestamp":[1709874000,1710129600,1710216000],
    "indicators":{"quote":[{"close":[100.0,105.0,106.0]}]}
}],"error":null}}"#;

const NOT_FOUND_BODY: &str = r#"{"chart":{"result":null,"error":{"code":"Not Found","description":"No data found, symbol may be delisted"}}}"#;

/// Routes chart requests by interval to fixed replies.
struct StubHttpClient {
    hourly: Result<HttpResponse, HttpError>,
    daily: Result<HttpResponse, HttpError>,
    urls: Mutex<Vec<String>>,
}

impl StubHttpClient {
    fn new(
        hourly: Result<HttpResponse, HttpError>,
        daily: Result<HttpResponse, HttpError>,
    ) -> Self {
        Self {
            hourly,
            daily,
            urls: Mutex::new(Vec::new()),
        }
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().expect("url log should not be poisoned").clone()
    }
}

impl HttpClient for StubHttpClient {
    fn execute<'a>(&'a self, request: HttpRequest) -> HttpFuture<'a> {
        let reply = if request.url.contains("interval=1h") {
            self.hourly.clone()
        } else {
            self.daily.clone()
        };
        self.urls
            .lock()
            .expect("url log should not be poisoned")
            .push(request.url);
        Box::pin(async move { reply })
    }
}

fn stub_config() -> YahooConfig {
    YahooConfig {
        base_url: String::from("https://charts.test/v8/finance/chart"),
        requests_per_second: 1_000,
        retry: RetryPolicy::fixed(Duration::ZERO, 1),
        ..YahooConfig::default()
    }
}

fn es() -> Symbol {
    Symbol::parse("ES=F").expect("valid symbol")
}

// =============================================================================
// Provider Contract: Yahoo chart adapter
// =============================================================================

#[tokio::test]
async fn when_both_charts_answer_the_pair_carries_both_views() {
    // Given: Hourly and daily charts are available
    let client = Arc::new(StubHttpClient::new(
        Ok(HttpResponse::ok_json(HOURLY_BODY)),
        Ok(HttpResponse::ok_json(DAILY_BODY)),
    ));
    let provider = YahooChartProvider::with_http_client(client.clone(), stub_config());

    // When: The series pair is fetched
    let series = provider.fetch(&es()).await.expect("fetch should succeed");

    // Then: Both views are populated, null closes dropped, daily name preferred
    assert_eq!(series.intraday.len(), 2);
    assert_eq!(series.daily.len(), 2);
    assert_eq!(series.name.as_deref(), Some("E-Mini S&P 500 Futures"));
    assert_eq!(series.daily.bars[1].price, 5140.5);

    // Then: One request per interval with the configured ranges
    let mut urls = client.urls();
    urls.sort();
    assert_eq!(
        urls,
        vec![
            String::from(
                "https://charts.test/v8/finance/chart/ES%3DF?range=1mo&interval=1h&includePrePost=false"
            ),
            String::from(
                "https://charts.test/v8/finance/chart/ES%3DF?range=3mo&interval=1d&includePrePost=false"
            ),
        ]
    );
}

#[tokio::test]
async fn when_the_hourly_chart_fails_the_pair_degrades_to_daily_only() {
    // Given: The hourly request is rejected but daily data exists
    let client = Arc::new(StubHttpClient::new(
        Ok(HttpResponse::new(400, "Bad Request")),
        Ok(HttpResponse::ok_json(DAILY_BODY)),
    ));
    let provider = YahooChartProvider::with_http_client(client, stub_config());

    // When: The series pair is fetched
    let series = provider.fetch(&es()).await.expect("daily view is enough");

    // Then: The intraday view is empty and the daily view is intact
    assert!(series.intraday.is_empty());
    assert_eq!(series.daily.len(), 2);
}

#[tokio::test]
async fn when_daily_bars_are_labeled_at_exchange_midnight_each_keeps_its_session_date() {
    // Given: No hourly data and daily bars labeled at midnight New York time
    let client = Arc::new(StubHttpClient::new(
        Ok(HttpResponse::new(400, "Bad Request")),
        Ok(HttpResponse::ok_json(EXCHANGE_MIDNIGHT_DAILY_BODY)),
    ));
    let provider = YahooChartProvider::with_http_client(client, stub_config());

    // When: The series pair is fetched
    let series = provider.fetch(&es()).await.expect("daily view is enough");

    // Then: Each bar sits on its own session date in Central time
    let zone = CivilZone::central().expect("tz database has America/Chicago");
    let dates = series
        .daily
        .bars
        .iter()
        .map(|bar| zone.local_date(bar.ts).to_string())
        .collect::<Vec<_>>();
    assert_eq!(dates, vec!["2024-03-08", "2024-03-11", "2024-03-12"]);

    // Then: Week to date on Tuesday falls back to Friday's close, not Monday's
    let now = UtcDateTime::parse("2024-03-12T15:00:00Z").expect("valid timestamp");
    let anchor = anchor_instant(Period::WeekToDate, now, &zone);
    let prices = resolve_prices(&series, anchor, &zone);
    assert_eq!(anchor.format_rfc3339(), "2024-03-11T05:00:00Z");
    assert_eq!(prices.price_start, Some(100.0));
    assert_eq!(prices.start_source, Some(StartSource::DailyFallback));
    assert_eq!(prices.price_current, Some(106.0));
}

#[tokio::test]
async fn when_the_symbol_is_unknown_the_fetch_reports_not_found() {
    // Given: Yahoo answers 404 with a chart error
    let client = Arc::new(StubHttpClient::new(
        Ok(HttpResponse::new(404, NOT_FOUND_BODY)),
        Ok(HttpResponse::new(404, NOT_FOUND_BODY)),
    ));
    let provider = YahooChartProvider::with_http_client(client.clone(), stub_config());

    // When: The series pair is fetched
    let error = provider.fetch(&es()).await.expect_err("must fail");

    // Then: The error is classified and not retried
    assert_eq!(error.kind(), ProviderErrorKind::NotFound);
    assert!(!error.retryable());
    assert_eq!(client.urls().len(), 2);
}

#[tokio::test]
async fn when_the_transport_keeps_failing_the_fetch_is_unavailable() {
    // Given: Every request fails to connect
    let client = Arc::new(StubHttpClient::new(
        Err(HttpError::new("connection refused")),
        Err(HttpError::new("connection refused")),
    ));
    let provider = YahooChartProvider::with_http_client(client.clone(), stub_config());

    // When: The series pair is fetched
    let error = provider.fetch(&es()).await.expect_err("must fail");

    // Then: The failure is retryable and each chart used its retry budget
    assert_eq!(error.kind(), ProviderErrorKind::Unavailable);
    assert!(error.retryable());
    assert_eq!(client.urls().len(), 4);
}

// =============================================================================
// Provider Contract: in-memory fixtures
// =============================================================================

#[tokio::test]
async fn when_a_fixture_file_is_loaded_it_serves_series_and_failures() {
    // Given: A fixture file on disk
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("fixture.json");
    std::fs::write(
        &path,
        r#"{
            "CL=F": {
                "name": "Crude Oil",
                "intraday": [{"ts": "2024-03-08T22:00:00Z", "price": 78.01}],
                "daily": []
            },
            "NG=F": {"error": "stale quote"}
        }"#,
    )
    .expect("write fixture");

    // When: The provider is built from it
    let provider = MemorySeriesProvider::from_json_file(&path).expect("fixture loads");

    // Then: Known tickers resolve and injected failures surface as errors
    let crude = provider
        .fetch(&Symbol::parse("CL=F").expect("valid symbol"))
        .await
        .expect("crude series");
    assert_eq!(crude.name.as_deref(), Some("Crude Oil"));
    assert_eq!(crude.intraday.bars[0].price, 78.01);

    let gas = provider
        .fetch(&Symbol::parse("NG=F").expect("valid symbol"))
        .await
        .expect_err("injected failure");
    assert_eq!(gas.kind(), ProviderErrorKind::Unavailable);

    let unknown = provider
        .fetch(&Symbol::parse("HG=F").expect("valid symbol"))
        .await
        .expect_err("unknown ticker");
    assert_eq!(unknown.kind(), ProviderErrorKind::NotFound);
}

#[test]
fn providers_are_shareable_across_tasks() {
    fn assert_shareable<T: Send + Sync + 'static>() {}

    assert_shareable::<MemorySeriesProvider>();
    assert_shareable::<YahooChartProvider>();
    assert_shareable::<Arc<dyn SeriesProvider>>();
}
