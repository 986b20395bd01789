use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Interval, Period, UtcDateTime, ValidationError};

/// Single timestamped price sample (close or last traded).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: UtcDateTime,
    pub price: f64,
}

impl Bar {
    /// Futures can settle below zero, so only non-finite prices are rejected.
    pub fn new(ts: UtcDateTime, price: f64) -> Result<Self, ValidationError> {
        if !price.is_finite() {
            return Err(ValidationError::NonFiniteValue { field: "price" });
        }
        Ok(Self { ts, price })
    }
}

/// One granularity view of a ticker's history.
///
/// Bars are expected in timestamp order but consumers must not rely on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    pub interval: Interval,
    pub bars: Vec<Bar>,
}

impl PriceSeries {
    pub fn new(interval: Interval, bars: Vec<Bar>) -> Self {
        Self { interval, bars }
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }
}

/// Intraday and daily history of one ticker, fetched once per run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesPair {
    pub name: Option<String>,
    pub intraday: PriceSeries,
    pub daily: PriceSeries,
}

impl SeriesPair {
    pub fn new(name: Option<String>, intraday: Vec<Bar>, daily: Vec<Bar>) -> Self {
        Self {
            name,
            intraday: PriceSeries::new(Interval::OneHour, intraday),
            daily: PriceSeries::new(Interval::OneDay, daily),
        }
    }

    pub fn empty() -> Self {
        Self::new(None, Vec::new(), Vec::new())
    }
}

/// Which view supplied the start price of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartSource {
    /// Last intraday bar at or before the anchor.
    Intraday,
    /// Last daily close before the anchor's calendar day.
    DailyFallback,
}

/// One ticker's computed output row.
///
/// Missing values are `None`; renderers show them as `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractResult {
    pub ticker: String,
    pub name: Option<String>,
    pub price_start: Option<f64>,
    pub price_current: Option<f64>,
    pub return_pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_source: Option<StartSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl ContractResult {
    /// Row for a ticker whose series could not be fetched.
    pub fn failed(ticker: impl Into<String>, failure: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: None,
            price_start: None,
            price_current: None,
            return_pct: None,
            start_source: None,
            failure: Some(failure.into()),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Result table of one run plus the context it was computed in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReturnsReport {
    pub run_id: Uuid,
    pub period: Period,
    pub anchor: UtcDateTime,
    pub generated_at: UtcDateTime,
    pub rows: Vec<ContractResult>,
}

impl ReturnsReport {
    pub fn failure_count(&self) -> usize {
        self.rows.iter().filter(|row| row.is_failure()).count()
    }

    pub fn all_failed(&self) -> bool {
        !self.rows.is_empty() && self.failure_count() == self.rows.len()
    }
}
