//! Task model.
//!
//! A task is a unit of required work: a duration in hours, an optional
//! deadline, a priority and the skills an actor needs to perform it.
//! Tasks may be split across several assignments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Task priority. Ordering follows importance: `Critical > High > Medium > Low`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Task lifecycle status. Only open tasks are planned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In progress", alias = "InProgress")]
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    /// Whether the status is open for planning.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

/// A task to be planned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Required work in hours (may be fractional).
    pub duration_hours: f64,
    /// Last day work may be dated on. `None` = horizon end.
    pub deadline: Option<NaiveDate>,
    /// Scheduling priority.
    pub priority: Priority,
    /// Skill identifiers an actor must hold.
    pub required_skills: BTreeSet<String>,
    /// Originally-assigned actor, preferred and defining replacements.
    pub assigned_to: Option<String>,
    /// Lifecycle status.
    pub status: TaskStatus,
}

impl Task {
    /// Creates a pending, medium-priority task of the given duration.
    pub fn new(id: impl Into<String>, duration_hours: f64) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            duration_hours,
            deadline: None,
            priority: Priority::Medium,
            required_skills: BTreeSet::new(),
            assigned_to: None,
            status: TaskStatus::Pending,
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Sets the deadline.
    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Adds a required skill.
    pub fn with_skill(mut self, skill: impl Into<String>) -> Self {
        self.required_skills.insert(skill.into());
        self
    }

    /// Sets the originally-assigned actor.
    pub fn with_assignee(mut self, actor_id: impl Into<String>) -> Self {
        self.assigned_to = Some(actor_id.into());
        self
    }

    /// Sets the status.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }

    /// Required work in whole minutes.
    pub fn required_minutes(&self) -> u32 {
        (self.duration_hours * 60.0).round().max(0.0) as u32
    }

    /// Deadline, defaulting to `horizon_end` when none is set.
    pub fn effective_deadline(&self, horizon_end: NaiveDate) -> NaiveDate {
        self.deadline.unwrap_or(horizon_end)
    }

    /// Whether assigning this task to `actor_id` is a replacement.
    pub fn is_replacement_for(&self, actor_id: &str) -> bool {
        self.assigned_to.as_deref().is_some_and(|a| a != actor_id)
    }
}
