use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Recurring reference point a return is measured from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    /// Most recent 17:00 in the civil zone.
    FivePm,
    /// Most recent Monday 00:00 in the civil zone.
    WeekToDate,
    /// First of the current month, 00:00 in the civil zone.
    MonthToDate,
}

impl Period {
    pub const ALL: [Self; 3] = [Self::FivePm, Self::WeekToDate, Self::MonthToDate];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FivePm => "5pm",
            Self::WeekToDate => "wtd",
            Self::MonthToDate => "mtd",
        }
    }

    /// Human readable description used in report titles.
    pub const fn label(self) -> &'static str {
        match self {
            Self::FivePm => "since most recent 5pm Central",
            Self::WeekToDate => "week to date",
            Self::MonthToDate => "month to date",
        }
    }

    /// Suffix for period-specific column names (`price_<suffix>`).
    pub const fn column_suffix(self) -> &'static str {
        match self {
            Self::FivePm => "5pm_ct",
            Self::WeekToDate => "week_start",
            Self::MonthToDate => "month_start",
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "5pm" | "fivepm" | "five-pm" => Ok(Self::FivePm),
            "wtd" | "week" | "week-to-date" => Ok(Self::WeekToDate),
            "mtd" | "month" | "month-to-date" => Ok(Self::MonthToDate),
            other => Err(ValidationError::InvalidPeriod {
                value: other.to_owned(),
            }),
        }
    }
}
