//! Time-of-day interval arithmetic.
//!
//! Pure functions over half-open intervals `[start, end)` measured in
//! minutes since midnight. Everything here is stateless and deterministic;
//! empty inputs yield empty outputs rather than errors.
//!
//! # Grid
//! Quantization aligns slots to a grid anchored at midnight, so a slot
//! boundary is always a multiple of the granularity regardless of where
//! the source window starts.

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

/// Minutes in a day; the exclusive upper bound for any interval.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A time-of-day interval [start, end).
///
/// Half-open interval: includes start, excludes end. Touching intervals
/// do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Interval {
    /// Interval start (minutes since midnight, inclusive).
    pub start_min: u32,
    /// Interval end (minutes since midnight, exclusive).
    pub end_min: u32,
}

impl Interval {
    /// Creates a new interval.
    pub fn new(start_min: u32, end_min: u32) -> Self {
        Self { start_min, end_min }
    }

    /// Builds an interval from two clock times.
    pub fn from_times(start: NaiveTime, end: NaiveTime) -> Self {
        Self::new(minutes_of(start), minutes_of(end))
    }

    /// Duration in minutes (zero for empty or inverted intervals).
    #[inline]
    pub fn duration_min(&self) -> u32 {
        self.end_min.saturating_sub(self.start_min)
    }

    /// Whether the interval has no extent.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end_min <= self.start_min
    }

    /// Whether two intervals overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        overlaps(self, other)
    }

    /// Whether `other` lies entirely within this interval.
    pub fn contains(&self, other: &Self) -> bool {
        other.start_min >= self.start_min && other.end_min <= self.end_min
    }

    /// Start as a clock time.
    pub fn start_time(&self) -> NaiveTime {
        time_of(self.start_min)
    }

    /// End as a clock time.
    pub fn end_time(&self) -> NaiveTime {
        time_of(self.end_min)
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_min / 60,
            self.start_min % 60,
            self.end_min / 60,
            self.end_min % 60
        )
    }
}

/// Minutes since midnight for a clock time (seconds are truncated).
#[inline]
pub fn minutes_of(t: NaiveTime) -> u32 {
    t.hour() * 60 + t.minute()
}

/// Clock time for a minute offset. Offsets past the last minute of the
/// day clamp to 23:59.
pub fn time_of(minutes: u32) -> NaiveTime {
    let m = minutes.min(MINUTES_PER_DAY - 1);
    NaiveTime::from_hms_opt(m / 60, m % 60, 0).unwrap_or(NaiveTime::MIN)
}

/// Whether two intervals overlap (touching endpoints do not).
pub fn overlaps(a: &Interval, b: &Interval) -> bool {
    a.start_min < b.end_min && b.start_min < a.end_min
}

/// Coalesces overlapping or adjacent intervals.
///
/// Input order does not matter; the result is sorted by start and
/// pairwise disjoint with gaps between consecutive entries. Empty
/// intervals are dropped.
pub fn merge(intervals: &[Interval]) -> Vec<Interval> {
    let mut sorted: Vec<Interval> = intervals.iter().filter(|i| !i.is_empty()).copied().collect();
    sorted.sort();

    let mut merged: Vec<Interval> = Vec::with_capacity(sorted.len());
    for iv in sorted {
        match merged.last_mut() {
            Some(last) if iv.start_min <= last.end_min => {
                last.end_min = last.end_min.max(iv.end_min);
            }
            _ => merged.push(iv),
        }
    }
    merged
}

/// Removes occupied time from a window.
///
/// Returns the free parts of `window`, sorted and disjoint.
pub fn subtract(window: &Interval, occupied: &[Interval]) -> Vec<Interval> {
    if window.is_empty() {
        return Vec::new();
    }

    let mut free = Vec::new();
    let mut cursor = window.start_min;
    for occ in merge(occupied) {
        if occ.end_min <= cursor {
            continue;
        }
        if occ.start_min >= window.end_min {
            break;
        }
        if occ.start_min > cursor {
            free.push(Interval::new(cursor, occ.start_min));
        }
        cursor = cursor.max(occ.end_min);
        if cursor >= window.end_min {
            break;
        }
    }
    if cursor < window.end_min {
        free.push(Interval::new(cursor, window.end_min));
    }
    free
}

/// Splits a window into grid-aligned slots of exactly `granularity_min`.
///
/// The first slot starts at the first grid point at or after the window
/// start; a trailing partial slot is dropped. A zero granularity yields
/// no slots.
pub fn quantize(window: &Interval, granularity_min: u32) -> Vec<Interval> {
    if granularity_min == 0 || window.is_empty() {
        return Vec::new();
    }

    let mut slots = Vec::new();
    let mut cursor = round_up(window.start_min, granularity_min);
    while cursor + granularity_min <= window.end_min {
        slots.push(Interval::new(cursor, cursor + granularity_min));
        cursor += granularity_min;
    }
    slots
}

/// Rounds `minutes` down to a multiple of `granularity_min`.
#[inline]
pub fn round_down(minutes: u32, granularity_min: u32) -> u32 {
    if granularity_min == 0 {
        return minutes;
    }
    minutes - minutes % granularity_min
}

/// Rounds `minutes` up to a multiple of `granularity_min`.
#[inline]
pub fn round_up(minutes: u32, granularity_min: u32) -> u32 {
    if granularity_min == 0 {
        return minutes;
    }
    minutes.div_ceil(granularity_min) * granularity_min
}

/// Whether both endpoints sit on the grid.
pub fn is_aligned(interval: &Interval, granularity_min: u32) -> bool {
    granularity_min != 0
        && interval.start_min % granularity_min == 0
        && interval.end_min % granularity_min == 0
}
