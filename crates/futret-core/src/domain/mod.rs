//! # Domain Models
//!
//! Canonical domain types for futret.
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Symbol`] | Validated provider ticker (`ES=F`, `^VIX`) |
//! | [`Interval`] | Series granularity (1h, 1d) |
//! | [`Period`] | Reference point kind (5pm, week, month) |
//! | [`UtcDateTime`] | UTC timestamp |
//! | [`Bar`] | Timestamped price sample |
//! | [`PriceSeries`] | Bars of one granularity |
//! | [`SeriesPair`] | Intraday and daily views of one ticker |
//! | [`ContractResult`] | One output row |
//! | [`ReturnsReport`] | Output rows of a run with run metadata |

mod interval;
mod models;
mod period;
mod symbol;
mod timestamp;

pub use interval::Interval;
pub use models::{
    Bar, ContractResult, PriceSeries, ReturnsReport, SeriesPair, StartSource,
};
pub use period::Period;
pub use symbol::Symbol;
pub use timestamp::UtcDateTime;
