//! Price series provider contract.
//!
//! The engine never talks to a market-data vendor directly. It asks a
//! [`SeriesProvider`] for one ticker's [`SeriesPair`] and treats any
//! [`ProviderError`] as a per-ticker outcome.
//!
//! | Provider | Description |
//! |----------|-------------|
//! | [`MemorySeriesProvider`] | In-memory fixtures, also loadable from JSON |
//! | [`crate::adapters::YahooChartProvider`] | Yahoo Finance chart API |

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::Deserialize;

use crate::{Bar, CoreError, SeriesPair, Symbol};

/// Provider-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Unavailable,
    RateLimited,
    NotFound,
    InvalidResponse,
    Internal,
}

/// Structured failure of a single ticker fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    kind: ProviderErrorKind,
    message: String,
    retryable: bool,
}

impl ProviderError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Unavailable,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::RateLimited,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn not_found(symbol: &Symbol) -> Self {
        Self {
            kind: ProviderErrorKind::NotFound,
            message: format!("no price history for '{symbol}'"),
            retryable: false,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::InvalidResponse,
            message: message.into(),
            retryable: false,
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            kind: ProviderErrorKind::Internal,
            message: message.into(),
            retryable: false,
        }
    }

    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn retryable(&self) -> bool {
        self.retryable
    }

    pub const fn code(&self) -> &'static str {
        match self.kind {
            ProviderErrorKind::Unavailable => "provider.unavailable",
            ProviderErrorKind::RateLimited => "provider.rate_limited",
            ProviderErrorKind::NotFound => "provider.not_found",
            ProviderErrorKind::InvalidResponse => "provider.invalid_response",
            ProviderErrorKind::Internal => "provider.internal",
        }
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for ProviderError {}

/// Boxed future returned by [`SeriesProvider::fetch`].
pub type FetchFuture<'a> =
    Pin<Box<dyn Future<Output = Result<SeriesPair, ProviderError>> + Send + 'a>>;

/// Source of intraday and daily price history.
///
/// Implementations must be `Send + Sync`; the batch runner shares one
/// provider across concurrent fetch tasks.
pub trait SeriesProvider: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &'static str;

    /// Fetch both series views for one ticker.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError`] when the ticker is unknown, the upstream is
    /// unreachable or rate limited, or the response cannot be parsed.
    fn fetch<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a>;
}

/// Fixed in-memory series keyed by ticker.
#[derive(Debug, Clone, Default)]
pub struct MemorySeriesProvider {
    series: BTreeMap<Symbol, Result<SeriesPair, ProviderError>>,
}

impl MemorySeriesProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_series(mut self, symbol: Symbol, series: SeriesPair) -> Self {
        self.series.insert(symbol, Ok(series));
        self
    }

    pub fn with_failure(mut self, symbol: Symbol, error: ProviderError) -> Self {
        self.series.insert(symbol, Err(error));
        self
    }

    /// Load fixtures from a JSON document of the form
    /// `{"ES=F": {"name": "...", "intraday": [{"ts": "...Z", "price": 1.0}], "daily": [...]}}`.
    /// An entry with an `"error"` message simulates a failing fetch.
    pub fn from_json(document: &str) -> Result<Self, CoreError> {
        let entries: BTreeMap<String, FixtureEntry> = serde_json::from_str(document)?;

        let mut provider = Self::new();
        for (ticker, entry) in entries {
            let symbol = Symbol::parse(&ticker)?;
            provider = match entry.error {
                Some(message) => provider.with_failure(symbol, ProviderError::unavailable(message)),
                None => provider.with_series(
                    symbol,
                    SeriesPair::new(entry.name, entry.intraday, entry.daily),
                ),
            };
        }
        Ok(provider)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CoreError> {
        let document = std::fs::read_to_string(path)?;
        Self::from_json(&document)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl SeriesProvider for MemorySeriesProvider {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn fetch<'a>(&'a self, symbol: &'a Symbol) -> FetchFuture<'a> {
        let outcome = self
            .series
            .get(symbol)
            .cloned()
            .unwrap_or_else(|| Err(ProviderError::not_found(symbol)));
        Box::pin(async move { outcome })
    }
}

#[derive(Debug, Deserialize)]
struct FixtureEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    intraday: Vec<Bar>,
    #[serde(default)]
    daily: Vec<Bar>,
    #[serde(default)]
    error: Option<String>,
}
