use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::error::ConfigurationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    OneDay,
    FiveDays,
    OneMonth,
    ThreeMonths,
    SixMonths,
    OneYear,
    YearToDate,
}

impl Period {
    pub const ALL: [Period; 7] = [
        Period::OneDay,
        Period::FiveDays,
        Period::OneMonth,
        Period::ThreeMonths,
        Period::SixMonths,
        Period::OneYear,
        Period::YearToDate,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Period::OneDay => "1 Day",
            Period::FiveDays => "5 Days",
            Period::OneMonth => "1 Month",
            Period::ThreeMonths => "3 Months",
            Period::SixMonths => "6 Months",
            Period::OneYear => "1 Year",
            Period::YearToDate => "YTD",
        }
    }

    fn code(self) -> &'static str {
        match self {
            Period::OneDay => "1d",
            Period::FiveDays => "5d",
            Period::OneMonth => "1mo",
            Period::ThreeMonths => "3mo",
            Period::SixMonths => "6mo",
            Period::OneYear => "1y",
            Period::YearToDate => "ytd",
        }
    }

    /// Range requested from the provider. A `1d` range only ever returns the
    /// current session, so the one-day window asks for `5d` to get a prior close.
    pub fn window(self) -> RetrievalWindow {
        let range = match self {
            Period::OneDay => "5d",
            other => other.code(),
        };
        RetrievalWindow { range }
    }

    pub fn compares_previous_session(self) -> bool {
        matches!(self, Period::OneDay)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl FromStr for Period {
    type Err = ConfigurationError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Period::ALL
            .into_iter()
            .find(|period| {
                period.label().eq_ignore_ascii_case(wanted) || period.code().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ConfigurationError::UnsupportedPeriod(raw.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RetrievalWindow {
    pub range: &'static str,
}
