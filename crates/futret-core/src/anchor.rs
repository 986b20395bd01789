//! Civil-time anchors.
//!
//! Every reference point is defined on the wall clock of a named timezone
//! (America/Chicago for CME futures), so the same period can map to different
//! UTC offsets across a daylight-saving transition.

use std::fmt::{Debug, Formatter};

use time::macros::time;
use time::{Date, Duration, OffsetDateTime, PrimitiveDateTime, Time};
use time_tz::{timezones, OffsetDateTimeExt, OffsetResult, PrimitiveDateTimeExt, TimeZone, Tz};

use crate::{CoreError, Period, UtcDateTime};

/// Timezone every anchor is computed in unless a caller overrides it.
pub const CENTRAL_ZONE: &str = "America/Chicago";

const FIVE_PM: Time = time!(17:00);
const GAP_STEP_MINUTES: i64 = 15;
const GAP_STEP_LIMIT: i64 = 4 * 24;

/// Named tz-database zone used to interpret local wall-clock times.
#[derive(Clone, Copy)]
pub struct CivilZone {
    tz: &'static Tz,
}

impl CivilZone {
    /// America/Chicago.
    pub fn central() -> Result<Self, CoreError> {
        Self::named(CENTRAL_ZONE)
    }

    pub fn named(name: &str) -> Result<Self, CoreError> {
        timezones::get_by_name(name)
            .map(|tz| Self { tz })
            .ok_or_else(|| CoreError::UnknownTimezone {
                name: name.to_owned(),
            })
    }

    pub fn name(&self) -> &str {
        self.tz.name()
    }

    /// The instant expressed on this zone's wall clock.
    pub fn local(&self, instant: UtcDateTime) -> OffsetDateTime {
        instant.into_inner().to_timezone(self.tz)
    }

    pub fn local_date(&self, instant: UtcDateTime) -> Date {
        self.local(instant).date()
    }

    /// Instant at which this zone's wall clock reads `date time`.
    ///
    /// Ambiguous readings (clocks falling back) take the earlier instant.
    /// Readings inside a spring-forward gap take the first instant after it.
    pub fn at_local(&self, date: Date, time: Time) -> UtcDateTime {
        let naive = PrimitiveDateTime::new(date, time);
        if let Some(resolved) = self.resolve(naive) {
            return resolved;
        }

        for step in 1..=GAP_STEP_LIMIT {
            let shifted = naive.checked_add(Duration::minutes(step * GAP_STEP_MINUTES));
            if let Some(resolved) = shifted.and_then(|shifted| self.resolve(shifted)) {
                return resolved;
            }
        }

        UtcDateTime::from_instant(naive.assume_utc())
    }

    fn resolve(&self, naive: PrimitiveDateTime) -> Option<UtcDateTime> {
        match naive.assume_timezone(self.tz) {
            OffsetResult::Some(instant) => Some(UtcDateTime::from_instant(instant)),
            OffsetResult::Ambiguous(first, second) => {
                Some(UtcDateTime::from_instant(first.min(second)))
            }
            OffsetResult::None => None,
        }
    }
}

impl Debug for CivilZone {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CivilZone").field(&self.name()).finish()
    }
}

impl PartialEq for CivilZone {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for CivilZone {}

/// Most recent reference instant of `period` that is not after `now`.
pub fn anchor_instant(period: Period, now: UtcDateTime, zone: &CivilZone) -> UtcDateTime {
    let today = zone.local_date(now);

    let candidate = match period {
        Period::FivePm => zone.at_local(today, FIVE_PM),
        Period::WeekToDate => zone.at_local(monday_of(today), Time::MIDNIGHT),
        Period::MonthToDate => zone.at_local(first_of_month(today), Time::MIDNIGHT),
    };
    if candidate <= now {
        return candidate;
    }

    match period {
        Period::FivePm => zone.at_local(days_before(today, 1), FIVE_PM),
        Period::WeekToDate => zone.at_local(days_before(monday_of(today), 7), Time::MIDNIGHT),
        Period::MonthToDate => {
            let previous_month = days_before(first_of_month(today), 1);
            zone.at_local(first_of_month(previous_month), Time::MIDNIGHT)
        }
    }
}

/// Midnight that opens the civil calendar day containing `instant`.
pub fn start_of_local_day(instant: UtcDateTime, zone: &CivilZone) -> UtcDateTime {
    zone.at_local(zone.local_date(instant), Time::MIDNIGHT)
}

fn monday_of(date: Date) -> Date {
    days_before(date, i64::from(date.weekday().number_days_from_monday()))
}

fn first_of_month(date: Date) -> Date {
    days_before(date, i64::from(date.day()) - 1)
}

fn days_before(date: Date, days: i64) -> Date {
    date.checked_sub(Duration::days(days)).unwrap_or(Date::MIN)
}
