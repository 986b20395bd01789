//! Start and current price lookup over a [`SeriesPair`].

use serde::{Deserialize, Serialize};

use crate::anchor::{start_of_local_day, CivilZone};
use crate::{Bar, SeriesPair, StartSource, UtcDateTime};

/// Prices found for one ticker relative to an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPrices {
    pub price_start: Option<f64>,
    pub price_current: Option<f64>,
    pub start_source: Option<StartSource>,
}

/// Resolve the start price at `anchor` and the latest price of `series`.
///
/// The start price is the last intraday bar at or before the anchor. Without
/// one, it is the last daily close before the anchor's calendar day in
/// `zone`. The current price is the newest intraday bar, else the newest
/// daily bar. Input order is not trusted; equal timestamps resolve to the bar
/// that appears last in the series.
pub fn resolve_prices(series: &SeriesPair, anchor: UtcDateTime, zone: &CivilZone) -> ResolvedPrices {
    let intraday = sorted_by_time(&series.intraday.bars);
    let daily = sorted_by_time(&series.daily.bars);

    let (price_start, start_source) = match last_at_or_before(&intraday, anchor) {
        Some(bar) => (Some(bar.price), Some(StartSource::Intraday)),
        None => {
            let day_start = start_of_local_day(anchor, zone);
            match last_before(&daily, day_start) {
                Some(bar) => (Some(bar.price), Some(StartSource::DailyFallback)),
                None => (None, None),
            }
        }
    };

    let price_current = intraday
        .last()
        .or_else(|| daily.last())
        .map(|bar| bar.price);

    ResolvedPrices {
        price_start,
        price_current,
        start_source,
    }
}

fn sorted_by_time(bars: &[Bar]) -> Vec<&Bar> {
    let mut sorted = bars.iter().collect::<Vec<_>>();
    // Stable: equal timestamps keep series order, so the last of a tie wins below.
    sorted.sort_by_key(|bar| bar.ts);
    sorted
}

fn last_at_or_before<'a>(sorted: &[&'a Bar], instant: UtcDateTime) -> Option<&'a Bar> {
    let end = sorted.partition_point(|bar| bar.ts <= instant);
    end.checked_sub(1).map(|index| sorted[index])
}

fn last_before<'a>(sorted: &[&'a Bar], instant: UtcDateTime) -> Option<&'a Bar> {
    let end = sorted.partition_point(|bar| bar.ts < instant);
    end.checked_sub(1).map(|index| sorted[index])
}
