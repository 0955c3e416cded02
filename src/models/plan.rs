//! Plan models.
//!
//! A plan is an ordered list of proposed actor-task-time assignments. It
//! is transient: produced by a plan source, checked by the validator, and
//! handed to an external step for persistence when error-free.
//!
//! # Wire format
//! ```json
//! {"plan": [{"actor_id": "E1", "task_id": "T1", "date": "2025-03-10",
//!            "start_time": "09:00", "end_time": "12:00", "pause": null}],
//!  "notes": "..."}
//! ```
//! `employee_id` is accepted as an alias of `actor_id`.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::wire::{hhmm, id};
use crate::error::Result;
use crate::interval::Interval;

/// A proposed assignment of an actor to a task on a date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedAssignment {
    /// Assigned actor.
    #[serde(alias = "employee_id", deserialize_with = "id::deserialize")]
    pub actor_id: String,
    /// Task worked on.
    #[serde(deserialize_with = "id::deserialize")]
    pub task_id: String,
    /// Working date.
    pub date: NaiveDate,
    /// Start time.
    #[serde(rename = "start_time", with = "hhmm")]
    pub start: NaiveTime,
    /// End time (exclusive).
    #[serde(rename = "end_time", with = "hhmm")]
    pub end: NaiveTime,
    /// Optional mid-shift pause marker.
    #[serde(default, with = "hhmm::option")]
    pub pause: Option<NaiveTime>,
}

impl PlannedAssignment {
    /// Creates an assignment without a pause.
    pub fn new(
        actor_id: impl Into<String>,
        task_id: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            task_id: task_id.into(),
            date,
            start,
            end,
            pause: None,
        }
    }

    /// Sets the pause marker.
    pub fn with_pause(mut self, pause: NaiveTime) -> Self {
        self.pause = Some(pause);
        self
    }

    /// Time-of-day interval covered.
    pub fn interval(&self) -> Interval {
        Interval::from_times(self.start, self.end)
    }

    /// Duration in minutes (zero if malformed).
    #[inline]
    pub fn duration_min(&self) -> u32 {
        self.interval().duration_min()
    }
}

/// An assignment already committed before the planning run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExistingAssignment {
    #[serde(alias = "employee_id", deserialize_with = "id::deserialize")]
    pub actor_id: String,
    #[serde(deserialize_with = "id::deserialize")]
    pub task_id: String,
    pub date: NaiveDate,
    #[serde(rename = "start_time", with = "hhmm")]
    pub start: NaiveTime,
    #[serde(rename = "end_time", with = "hhmm")]
    pub end: NaiveTime,
}

impl ExistingAssignment {
    /// Creates an existing assignment.
    pub fn new(
        actor_id: impl Into<String>,
        task_id: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Self {
        Self {
            actor_id: actor_id.into(),
            task_id: task_id.into(),
            date,
            start,
            end,
        }
    }

    /// Time-of-day interval covered.
    pub fn interval(&self) -> Interval {
        Interval::from_times(self.start, self.end)
    }
}

/// A candidate plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    /// Assignments in proposal order.
    #[serde(rename = "plan", default)]
    pub assignments: Vec<PlannedAssignment>,
    /// Free-form notes from the proposer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Plan {
    /// Creates an empty plan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the notes.
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Appends an assignment.
    pub fn add_assignment(&mut self, assignment: PlannedAssignment) {
        self.assignments.push(assignment);
    }

    /// Number of assignments.
    pub fn assignment_count(&self) -> usize {
        self.assignments.len()
    }

    /// Whether the plan has no assignments.
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// All assignments for a task.
    pub fn assignments_for_task(&self, task_id: &str) -> Vec<&PlannedAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.task_id == task_id)
            .collect()
    }

    /// All assignments for an actor.
    pub fn assignments_for_actor(&self, actor_id: &str) -> Vec<&PlannedAssignment> {
        self.assignments
            .iter()
            .filter(|a| a.actor_id == actor_id)
            .collect()
    }

    /// Minutes planned for a task.
    pub fn planned_minutes_for_task(&self, task_id: &str) -> u32 {
        self.assignments_for_task(task_id)
            .iter()
            .map(|a| a.duration_min())
            .sum()
    }

    /// Parses a plan document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Renders the plan document.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn sample_plan() -> Plan {
        let mut p = Plan::new().with_notes("sample");
        p.add_assignment(PlannedAssignment::new("E1", "T1", d(10), t(9, 0), t(12, 0)));
        p.add_assignment(PlannedAssignment::new("E2", "T1", d(10), t(13, 0), t(14, 30)));
        p.add_assignment(PlannedAssignment::new("E1", "T2", d(11), t(9, 0), t(10, 0)));
        p
    }

    #[test]
    fn test_plan_queries() {
        let p = sample_plan();
        assert_eq!(p.assignment_count(), 3);
        assert_eq!(p.assignments_for_task("T1").len(), 2);
        assert_eq!(p.assignments_for_actor("E1").len(), 2);
        assert_eq!(p.planned_minutes_for_task("T1"), 270);
        assert_eq!(p.planned_minutes_for_task("T9"), 0);
    }

    #[test]
    fn test_empty_plan() {
        let p = Plan::new();
        assert!(p.is_empty());
        assert_eq!(p.assignment_count(), 0);
    }

    #[test]
    fn test_malformed_duration_is_zero() {
        let a = PlannedAssignment::new("E1", "T1", d(10), t(12, 0), t(9, 0));
        assert_eq!(a.duration_min(), 0);
    }

    #[test]
    fn test_plan_document_format() {
        let json = sample_plan().to_json_pretty().unwrap();
        assert!(json.contains("\"plan\""));
        assert!(json.contains("\"start_time\": \"09:00\""));
        assert!(json.contains("\"date\": \"2025-03-10\""));
        assert!(json.contains("\"pause\": null"));
    }

    #[test]
    fn test_parse_external_document() {
        let json = r#"{
            "plan": [
                {"employee_id": 3, "task_id": 12, "date": "2025-03-10",
                 "start_time": "08:00", "end_time": "10:30", "pause": "09:00"}
            ],
            "notes": "proposed"
        }"#;
        let p = Plan::from_json_str(json).unwrap();
        assert_eq!(p.assignments[0].actor_id, "3");
        assert_eq!(p.assignments[0].task_id, "12");
        assert_eq!(p.assignments[0].pause, Some(t(9, 0)));
        assert_eq!(p.assignments[0].duration_min(), 150);
        assert_eq!(p.notes.as_deref(), Some("proposed"));
    }

    #[test]
    fn test_parse_missing_plan_key() {
        let p = Plan::from_json_str("{}").unwrap();
        assert!(p.is_empty());
    }
}
