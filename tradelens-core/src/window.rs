//! Time windows — inclusive lower-bound filters over trade dates.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::domain::NormalizedTrade;

/// Reporting window selected by the caller.
///
/// Bounds are computed against an explicit `now` anchor so window math stays
/// a pure function of its inputs; nothing here reads the clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeWindow {
    Last7Days,
    Last30Days,
    Last90Days,
    YearToDate,
    LastYear,
    #[default]
    AllTime,
}

/// Accepted window tokens, in display order.
pub const WINDOW_TOKENS: &[&str] = &["7d", "30d", "90d", "ytd", "1y", "all"];

impl TimeWindow {
    /// Inclusive lower bound against `now`, or `None` for `AllTime`. The
    /// rolling windows subtract whole days; `LastYear` steps back one
    /// calendar year. There is no upper bound; future-dated entries always
    /// pass.
    pub fn start_bound(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Self::Last7Days => Some(now - Duration::days(7)),
            Self::Last30Days => Some(now - Duration::days(30)),
            Self::Last90Days => Some(now - Duration::days(90)),
            // A Feb 29 anchor has no prior-year twin; 365 days back is Mar 1
            Self::LastYear => Some(
                now.with_year(now.year() - 1)
                    .unwrap_or_else(|| now - Duration::days(365)),
            ),
            Self::YearToDate => Utc.with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0).single(),
            Self::AllTime => None,
        }
    }

    /// Whether a trade falls inside the window, judged by exit date with
    /// entry date as fallback. Undated trades pass only when no bound is
    /// active.
    pub fn contains(&self, trade: &NormalizedTrade, now: DateTime<Utc>) -> bool {
        match self.start_bound(now) {
            None => true,
            Some(start) => match trade.exit_date.or(trade.entry_date) {
                Some(date) => date >= start,
                None => false,
            },
        }
    }

    /// Borrowing filter over a batch, preserving order.
    pub fn filter<'a>(
        &self,
        trades: &'a [NormalizedTrade],
        now: DateTime<Utc>,
    ) -> Vec<&'a NormalizedTrade> {
        trades.iter().filter(|t| self.contains(t, now)).collect()
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = match self {
            Self::Last7Days => "7d",
            Self::Last30Days => "30d",
            Self::Last90Days => "90d",
            Self::YearToDate => "ytd",
            Self::LastYear => "1y",
            Self::AllTime => "all",
        };
        f.write_str(token)
    }
}

/// Error for an unrecognized window token.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown time window '{0}' (expected one of: 7d, 30d, 90d, ytd, 1y, all)")]
pub struct ParseWindowError(String);

impl FromStr for TimeWindow {
    type Err = ParseWindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "7d" => Ok(Self::Last7Days),
            "30d" => Ok(Self::Last30Days),
            "90d" => Ok(Self::Last90Days),
            "ytd" => Ok(Self::YearToDate),
            "1y" => Ok(Self::LastYear),
            "all" => Ok(Self::AllTime),
            other => Err(ParseWindowError(other.to_string())),
        }
    }
}
