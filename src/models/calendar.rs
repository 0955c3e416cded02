//! Calendar models: planning horizon, ISO week keys, weekly availability
//! windows and absence ranges.
//!
//! # Precedence
//! Absences override availability. An actor can work at a moment iff:
//! - it falls within one of the availability windows for that weekday, AND
//! - no approved absence range covers that date.
//!
//! Absences are date-level: a single absent day removes every window
//! of that day.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use super::wire::hhmm;
use crate::error::{Result, ScheduleError};
use crate::interval::Interval;

/// Inclusive date range a planning run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    /// First planned day (inclusive).
    pub from: NaiveDate,
    /// Last planned day (inclusive).
    pub to: NaiveDate,
}

impl Horizon {
    /// Creates a horizon, rejecting an inverted range.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if to < from {
            return Err(ScheduleError::InvalidHorizon {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        Ok(Self { from, to })
    }

    /// Horizon of `weeks` weeks starting at `from` (both ends inclusive).
    pub fn weeks_from(from: NaiveDate, weeks: u32) -> Self {
        Self {
            from,
            to: from + Duration::weeks(i64::from(weeks)),
        }
    }

    /// Whether a date falls inside the horizon.
    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    /// Days from `from` through `min(to, until)`, in order.
    pub fn days_until(&self, until: NaiveDate) -> impl Iterator<Item = NaiveDate> {
        let last = self.to.min(until);
        self.from.iter_days().take_while(move |d| *d <= last)
    }

    /// Every day of the horizon, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.days_until(self.to)
    }

    /// Number of days covered.
    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }
}

/// ISO-8601 calendar week, the aggregation key for weekly hour caps.
///
/// Keyed by ISO week-numbering year, so the last days of December may
/// belong to week 1 of the following year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    /// ISO week-numbering year.
    pub year: i32,
    /// ISO week number (1..=53).
    pub week: u32,
}

impl WeekKey {
    /// The ISO week containing `date`.
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl std::fmt::Display for WeekKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// A recurring weekly availability window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    /// Day of week the window recurs on.
    pub weekday: Weekday,
    /// Window start.
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    /// Window end (exclusive).
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
}

impl AvailabilityWindow {
    /// Creates a new window.
    pub fn new(weekday: Weekday, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            weekday,
            start,
            end,
        }
    }

    /// The window as a time-of-day interval.
    pub fn interval(&self) -> Interval {
        Interval::from_times(self.start, self.end)
    }
}

/// An approved absence: the actor is unavailable on every date in
/// `[start, end]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    /// First absent day.
    pub start: NaiveDate,
    /// Last absent day (inclusive).
    pub end: NaiveDate,
}

impl Absence {
    /// Creates an absence range.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Whether the range covers `date`.
    #[inline]
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}
