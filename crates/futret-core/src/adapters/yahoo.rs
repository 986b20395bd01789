use std::sync::Arc;

use serde::Deserialize;
use time::macros::time;
use time::{Date, Time, UtcOffset};

use crate::http_client::{HttpClient, HttpRequest, HttpResponse, ReqwestHttpClient};
use crate::provider::{FetchFuture, ProviderError, SeriesProvider};
use crate::retry::{RequestPacer, RetryPolicy};
use crate::{Bar, CivilZone, Interval, SeriesPair, Symbol, UtcDateTime};

const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

/// Central-time wall clock at which a daily bar is considered settled.
const SESSION_CLOSE: Time = time!(16:00);

/// Settings for [`YahooChartProvider`].
#[derive(Debug, Clone, PartialEq)]
pub struct YahooConfig {
    pub base_url: String,
    /// Lookback requested for hourly bars. Yahoo keeps roughly two years of them.
    pub intraday_range: String,
    /// Lookback requested for daily bars; must reach before the month start.
    pub daily_range: String,
    pub timeout_ms: u64,
    pub requests_per_second: u32,
    pub retry: RetryPolicy,
}

impl Default for YahooConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            intraday_range: String::from("1mo"),
            daily_range: String::from("3mo"),
            timeout_ms: 10_000,
            requests_per_second: 4,
            retry: RetryPolicy::default(),
        }
    }
}

/// Yahoo Finance chart API provider.
///
/// Each ticker costs two chart requests: hourly closes for the intraday view
/// and daily closes for the fallback view. A failed intraday request degrades
/// to an empty intraday series; a failed daily request fails the ticker.
/// Daily bars are re-stamped onto their session date (see `SessionDates`).
#[derive(Clone)]
pub struct YahooChartProvider {
    config: YahooConfig,
    http_client: Arc<dyn HttpClient>,
    pacer: RequestPacer,
}

impl Default for YahooChartProvider {
    fn default() -> Self {
        Self::new(YahooConfig::default())
    }
}

impl YahooChartProvider {
    pub fn new(config: YahooConfig) -> Self {
        Self::with_http_client(Arc::new(ReqwestHttpClient::new()), config)
    }

    pub fn with_http_client(http_client: Arc<dyn HttpClient>, config: YahooConfig) -> Self {
        let pacer = RequestPacer::per_second(config.requests_per_second);
        Self {
            config,
            http_client,
            pacer,
        }
    }

    pub fn config(&self) -> &YahooConfig {
        &self.config
    }

    fn chart_url(&self, symbol: &Symbol, interval: Interval, range: &str) -> String {
        format!(
            "{}/{}?range={}&interval={}&includePrePost=false",
            self.config.base_url.trim_end_matches('/'),
            urlencoding::encode(symbol.as_str()),
            urlencoding::encode(range),
            interval.as_str(),
        )
    }

    async fn fetch_pair(&self, symbol: &Symbol) -> Result<SeriesPair, ProviderError> {
        let (intraday, daily) = tokio::join!(
            self.fetch_chart(symbol, Interval::OneHour, &self.config.intraday_range),
            self.fetch_chart(symbol, Interval::OneDay, &self.config.daily_range),
        );
        let daily = daily?;
        let intraday = intraday.unwrap_or_else(|error| {
            tracing::debug!(%symbol, %error, "intraday chart unavailable; using daily only");
            ChartSeries::default()
        });

        Ok(SeriesPair::new(
            daily.name.or(intraday.name),
            intraday.bars,
            daily.bars,
        ))
    }

    async fn fetch_chart(
        &self,
        symbol: &Symbol,
        interval: Interval,
        range: &str,
    ) -> Result<ChartSeries, ProviderError> {
        let request = HttpRequest::get(self.chart_url(symbol, interval, range))
            .with_header("referer", "https://finance.yahoo.com/")
            .with_header("accept", "application/json")
            .with_timeout_ms(self.config.timeout_ms);
        let retry = &self.config.retry;

        let mut attempt = 0;
        loop {
            self.pacer.ready().await;

            let retry_reason = match self.http_client.execute(request.clone()).await {
                Ok(response) if response.is_success() => {
                    return parse_chart(symbol, interval, &response.body)
                }
                Ok(response) => {
                    let error = status_error(symbol, &response);
                    if attempt >= retry.max_retries || !retry.should_retry_status(response.status) {
                        return Err(error);
                    }
                    error
                }
                Err(error) => {
                    let error_retryable = error.retryable();
                    let error = ProviderError::unavailable(format!(
                        "yahoo transport error: {}",
                        error.message()
                    ));
                    if attempt >= retry.max_retries || !error_retryable {
                        return Err(error);
                    }
                    error
                }
            };

            let delay = retry.delay_for_attempt(attempt);
            tracing::debug!(
                %symbol,
                interval = %interval,
                attempt,
                delay_ms = delay.as_millis() as u64,
                reason = %retry_reason,
                "retrying yahoo chart request"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

impl SeriesProvider for YahooChartProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    fn fetch<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a> {
        Box::pin(self.fetch_pair(symbol))
    }
}

#[derive(Debug, Default)]
struct ChartSeries {
    name: Option<String>,
    bars: Vec<Bar>,
}

fn status_error(symbol: &Symbol, response: &HttpResponse) -> ProviderError {
    let upstream = serde_json::from_str::<YahooChartResponse>(&response.body)
        .ok()
        .and_then(|parsed| parsed.chart.error);
    if let Some(error) = &upstream {
        if error.is_not_found() {
            return ProviderError::not_found(symbol);
        }
    }

    let detail = upstream
        .map(|error| error.describe())
        .unwrap_or_else(|| format!("status {}", response.status));
    match response.status {
        404 => ProviderError::not_found(symbol),
        429 => ProviderError::rate_limited(format!("yahoo rate limited: {detail}")),
        408 | 500..=599 => ProviderError::unavailable(format!("yahoo unavailable: {detail}")),
        _ => ProviderError::invalid_response(format!("yahoo rejected request: {detail}")),
    }
}

fn parse_chart(
    symbol: &Symbol,
    interval: Interval,
    body: &str,
) -> Result<ChartSeries, ProviderError> {
    let response: YahooChartResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::invalid_response(format!("failed to parse yahoo chart: {e}")))?;

    if let Some(error) = response.chart.error {
        return Err(if error.is_not_found() {
            ProviderError::not_found(symbol)
        } else {
            ProviderError::unavailable(format!("yahoo chart error: {}", error.describe()))
        });
    }

    let result = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| ProviderError::not_found(symbol))?;

    let name = result
        .meta
        .as_ref()
        .and_then(|meta| meta.short_name.clone().or_else(|| meta.long_name.clone()))
        .map(|name| name.trim().to_owned())
        .filter(|name| !name.is_empty());

    let timestamps = result.timestamp.unwrap_or_default();
    let closes = result
        .indicators
        .quote
        .into_iter()
        .next()
        .map(|quote| quote.close)
        .unwrap_or_default();

    let session_dates = match interval {
        Interval::OneDay => Some(SessionDates::from_meta(result.meta.as_ref())?),
        Interval::OneHour => None,
    };

    let mut bars = Vec::with_capacity(timestamps.len());
    for (seconds, close) in timestamps.iter().zip(closes) {
        let Some(close) = close else { continue };
        let mut ts = UtcDateTime::from_unix_timestamp(*seconds)
            .map_err(|e| ProviderError::invalid_response(e.to_string()))?;
        if let Some(session_dates) = &session_dates {
            ts = session_dates.settled_at(ts);
        }
        if let Ok(bar) = Bar::new(ts, close) {
            bars.push(bar);
        }
    }

    Ok(ChartSeries { name, bars })
}

/// Re-stamps daily bars from Yahoo's label (midnight on the exchange clock)
/// to the Central-time close of the session date they belong to.
struct SessionDates {
    exchange: ExchangeClock,
    central: CivilZone,
}

enum ExchangeClock {
    Zone(CivilZone),
    Offset(UtcOffset),
    Central,
}

impl SessionDates {
    fn from_meta(meta: Option<&YahooChartMeta>) -> Result<Self, ProviderError> {
        let central =
            CivilZone::central().map_err(|e| ProviderError::invalid_response(e.to_string()))?;
        let zone = meta
            .and_then(|meta| meta.exchange_timezone_name.as_deref())
            .and_then(|name| CivilZone::named(name).ok());
        let offset = meta
            .and_then(|meta| meta.gmtoffset)
            .and_then(|seconds| i32::try_from(seconds).ok())
            .and_then(|seconds| UtcOffset::from_whole_seconds(seconds).ok());

        let exchange = match (zone, offset) {
            (Some(zone), _) => ExchangeClock::Zone(zone),
            (None, Some(offset)) => ExchangeClock::Offset(offset),
            (None, None) => ExchangeClock::Central,
        };
        Ok(Self { exchange, central })
    }

    fn session_date(&self, label: UtcDateTime) -> Date {
        match &self.exchange {
            ExchangeClock::Zone(zone) => zone.local_date(label),
            ExchangeClock::Offset(offset) => label.into_inner().to_offset(*offset).date(),
            ExchangeClock::Central => self.central.local_date(label),
        }
    }

    fn settled_at(&self, label: UtcDateTime) -> UtcDateTime {
        self.central.at_local(self.session_date(label), SESSION_CLOSE)
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResponse {
    chart: YahooChartData,
}

#[derive(Debug, Deserialize)]
struct YahooChartData {
    #[serde(default)]
    result: Option<Vec<YahooChartResult>>,
    #[serde(default)]
    error: Option<YahooChartError>,
}

#[derive(Debug, Deserialize)]
struct YahooChartError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

impl YahooChartError {
    fn is_not_found(&self) -> bool {
        self.code
            .as_deref()
            .is_some_and(|code| code.eq_ignore_ascii_case("not found"))
    }

    fn describe(&self) -> String {
        match (&self.code, &self.description) {
            (Some(code), Some(description)) => format!("{code}: {description}"),
            (Some(code), None) => code.clone(),
            (None, Some(description)) => description.clone(),
            (None, None) => String::from("unknown error"),
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooChartResult {
    #[serde(default)]
    meta: Option<YahooChartMeta>,
    #[serde(default)]
    timestamp: Option<Vec<i64>>,
    indicators: YahooChartIndicators,
}

#[derive(Debug, Deserialize)]
struct YahooChartMeta {
    #[serde(rename = "shortName", default)]
    short_name: Option<String>,
    #[serde(rename = "longName", default)]
    long_name: Option<String>,
    #[serde(rename = "exchangeTimezoneName", default)]
    exchange_timezone_name: Option<String>,
    #[serde(default)]
    gmtoffset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct YahooChartIndicators {
    #[serde(default)]
    quote: Vec<YahooChartQuote>,
}

#[derive(Debug, Deserialize)]
struct YahooChartQuote {
    #[serde(default)]
    close: Vec<Option<f64>>,
}
