//! Actor model.
//!
//! Actors are the people tasks are assigned to. Each actor has a skill
//! set, recurring weekly availability, approved absences and a weekly
//! hour cap that may be exceeded only for authorized replacements.

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::{Absence, AvailabilityWindow};
use crate::interval::{merge, Interval};

/// A schedulable actor (employee).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Unique actor identifier.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Weekly working-hour cap.
    pub weekly_hours_max: f64,
    /// Whether this actor accepts replacement work (and being replaced).
    pub accept_replacement: bool,
    /// Skill identifiers held.
    pub skills: BTreeSet<String>,
    /// Recurring availability, in load order.
    pub availability: Vec<AvailabilityWindow>,
    /// Approved absence ranges only.
    pub absences: Vec<Absence>,
}

impl Actor {
    /// Creates an actor with no skills, no availability and a 35h cap.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            weekly_hours_max: 35.0,
            accept_replacement: false,
            skills: BTreeSet::new(),
            availability: Vec::new(),
            absences: Vec::new(),
        }
    }

    /// Sets the actor name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the weekly hour cap.
    pub fn with_weekly_hours(mut self, hours: f64) -> Self {
        self.weekly_hours_max = hours;
        self
    }

    /// Sets the replacement flag.
    pub fn with_replacement(mut self, accept: bool) -> Self {
        self.accept_replacement = accept;
        self
    }

    /// Adds a skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.skills.insert(skill.into());
        self
    }

    /// Adds an availability window.
    pub fn with_window(mut self, window: AvailabilityWindow) -> Self {
        self.availability.push(window);
        self
    }

    /// Adds an approved absence.
    pub fn with_absence(mut self, absence: Absence) -> Self {
        self.absences.push(absence);
        self
    }

    /// Whether this actor has a given skill.
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }

    /// Whether this actor holds every skill in `required`.
    pub fn is_qualified_for(&self, required: &BTreeSet<String>) -> bool {
        required.is_subset(&self.skills)
    }

    /// Skills in `required` this actor lacks, in sorted order.
    pub fn missing_skills<'a>(&'a self, required: &'a BTreeSet<String>) -> Vec<&'a str> {
        required
            .difference(&self.skills)
            .map(String::as_str)
            .collect()
    }

    /// Availability on a weekday, merged into disjoint sorted intervals.
    pub fn windows_on(&self, weekday: Weekday) -> Vec<Interval> {
        let raw: Vec<Interval> = self
            .availability
            .iter()
            .filter(|w| w.weekday == weekday)
            .map(AvailabilityWindow::interval)
            .collect();
        merge(&raw)
    }

    /// Whether any approved absence covers `date`.
    pub fn is_absent_on(&self, date: NaiveDate) -> bool {
        self.absences.iter().any(|a| a.covers(date))
    }

    /// Weekly cap in minutes.
    #[inline]
    pub fn weekly_cap_minutes(&self) -> f64 {
        self.weekly_hours_max * 60.0
    }
}
