use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::dates::{format_short_date, format_timestamp};

pub const DEFAULT_PAST_DAYS: i64 = 3;
pub const DEFAULT_FUTURE_DAYS: i64 = 7;
/// Preferences beyond a year are clamped.
pub const MAX_VIEW_DAYS: i64 = 366;

/// How far back and ahead the dashboard looks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewDays {
    pub past: i64,
    pub future: i64,
}

impl Default for ViewDays {
    fn default() -> Self {
        Self {
            past: DEFAULT_PAST_DAYS,
            future: DEFAULT_FUTURE_DAYS,
        }
    }
}

impl ViewDays {
    /// Apply stored preferences over `fallback`. Missing or non-positive
    /// values fall through to the fallback, then to the built-in defaults.
    pub fn resolve(past: Option<i64>, future: Option<i64>, fallback: ViewDays) -> Self {
        let pick = |value: Option<i64>, fallback: i64, default: i64| {
            value
                .filter(|d| *d > 0)
                .or(Some(fallback).filter(|d| *d > 0))
                .unwrap_or(default)
                .min(MAX_VIEW_DAYS)
        };
        Self {
            past: pick(past, fallback.past, DEFAULT_PAST_DAYS),
            future: pick(future, fallback.future, DEFAULT_FUTURE_DAYS),
        }
    }
}

/// Date range a sync searches: `[today - past, today + future + 1]`, UTC.
///
/// The end is one day past the preference because the API treats it as
/// exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl SearchWindow {
    pub fn compute(now: DateTime<Utc>, days: ViewDays) -> Self {
        let today = now.date_naive();
        Self {
            start: TimeDelta::try_days(days.past)
                .and_then(|d| today.checked_sub_signed(d))
                .unwrap_or(today),
            end: TimeDelta::try_days(days.future.saturating_add(1))
                .and_then(|d| today.checked_add_signed(d))
                .unwrap_or(today),
        }
    }

    /// Midnight UTC at the window start.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::MIN).and_utc()
    }

    /// `after=` value for the activity feed.
    pub fn happenings_after(&self) -> String {
        format_timestamp(self.start_instant())
    }

    /// `until=` value for upcoming events.
    pub fn events_until(&self) -> String {
        format_short_date(self.end)
    }
}
