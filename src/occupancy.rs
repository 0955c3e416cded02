//! Per-actor, per-date occupancy tracking.
//!
//! Each planner or validator run builds its own map from pre-existing
//! assignments and extends it as it accepts new intervals. The map is
//! never shared between runs.
//!
//! # Invariant
//! For every (actor, date) the stored intervals are sorted, merged and
//! pairwise disjoint.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use crate::interval::{merge, Interval};
use crate::models::{ExistingAssignment, WeekKey};

#[derive(Debug, Clone, Default)]
pub struct OccupancyMap {
    by_actor: BTreeMap<String, BTreeMap<NaiveDate, Vec<Interval>>>,
}

impl OccupancyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a map from already-committed assignments.
    pub fn from_existing(existing: &[ExistingAssignment]) -> Self {
        let mut map = Self::new();
        for e in existing {
            map.insert(&e.actor_id, e.date, e.interval());
        }
        map
    }

    /// Records an interval, coalescing with neighbours.
    pub fn insert(&mut self, actor_id: &str, date: NaiveDate, interval: Interval) {
        if interval.is_empty() {
            return;
        }
        let day = self
            .by_actor
            .entry(actor_id.to_string())
            .or_default()
            .entry(date)
            .or_default();
        day.push(interval);
        *day = merge(day);
    }

    /// Occupied intervals for an actor on a date.
    pub fn intervals(&self, actor_id: &str, date: NaiveDate) -> &[Interval] {
        self.by_actor
            .get(actor_id)
            .and_then(|days| days.get(&date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Whether `interval` is free for the actor on `date`.
    pub fn is_free(&self, actor_id: &str, date: NaiveDate, interval: &Interval) -> bool {
        self.intervals(actor_id, date)
            .iter()
            .all(|occ| !occ.overlaps(interval))
    }

    /// Occupied minutes for an actor in an ISO week.
    pub fn minutes_in_week(&self, actor_id: &str, week: WeekKey) -> u32 {
        self.by_actor
            .get(actor_id)
            .map(|days| {
                days.iter()
                    .filter(|(date, _)| WeekKey::of(**date) == week)
                    .flat_map(|(_, ivs)| ivs.iter())
                    .map(Interval::duration_min)
                    .sum()
            })
            .unwrap_or(0)
    }

    /// Occupied minutes for an actor across all dates.
    pub fn total_minutes(&self, actor_id: &str) -> u32 {
        self.by_actor
            .get(actor_id)
            .map(|days| days.values().flatten().map(Interval::duration_min).sum())
            .unwrap_or(0)
    }
}
