//! Data-store contract.
//!
//! The context builder reads everything it needs through one
//! [`ScheduleStore::snapshot`] call per run, so a run never observes a
//! half-updated store. Records mirror the relational rows an upstream
//! store keeps; the builder joins them into domain models.

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::error::{Result, ScheduleError};
use crate::models::wire::{hhmm, id};
use crate::models::{ExistingAssignment, Horizon, Priority, TaskStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorRecord {
    #[serde(deserialize_with = "id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub weekly_hours_max: f64,
    #[serde(default)]
    pub accept_replacement: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorSkillRecord {
    #[serde(alias = "employee_id", deserialize_with = "id::deserialize")]
    pub actor_id: String,
    #[serde(deserialize_with = "id::deserialize")]
    pub skill_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    #[serde(alias = "employee_id", deserialize_with = "id::deserialize")]
    pub actor_id: String,
    #[serde(alias = "day_of_week")]
    pub weekday: Weekday,
    #[serde(rename = "start_time", with = "hhmm")]
    pub start: NaiveTime,
    #[serde(rename = "end_time", with = "hhmm")]
    pub end: NaiveTime,
}

/// Absence approval state. Only `Approved` ranges constrain planning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbsenceStatus {
    Approved,
    Pending,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbsenceRecord {
    #[serde(alias = "employee_id", deserialize_with = "id::deserialize")]
    pub actor_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: AbsenceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    #[serde(deserialize_with = "id::deserialize")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    pub duration_hours: f64,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "id::option::deserialize")]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSkillRecord {
    #[serde(deserialize_with = "id::deserialize")]
    pub task_id: String,
    #[serde(deserialize_with = "id::deserialize")]
    pub skill_id: String,
}

/// Everything one planning run reads, as a single consistent snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub actors: Vec<ActorRecord>,
    #[serde(default)]
    pub actor_skills: Vec<ActorSkillRecord>,
    #[serde(default)]
    pub availability: Vec<AvailabilityRecord>,
    #[serde(default)]
    pub absences: Vec<AbsenceRecord>,
    #[serde(default)]
    pub tasks: Vec<TaskRecord>,
    #[serde(default)]
    pub task_skills: Vec<TaskSkillRecord>,
    #[serde(default)]
    pub assignments: Vec<ExistingAssignment>,
}

impl StoreSnapshot {
    /// Drops existing assignments dated outside the horizon.
    pub fn restrict_to(mut self, horizon: &Horizon) -> Self {
        self.assignments.retain(|a| horizon.contains(a.date));
        self
    }
}

/// Read contract of the upstream data store.
pub trait ScheduleStore {
    /// Reads a consistent snapshot for `horizon`. Existing assignments
    /// must be restricted to the horizon.
    fn snapshot(&self, horizon: &Horizon) -> Result<StoreSnapshot>;
}

/// In-process store holding a fixed snapshot.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    data: StoreSnapshot,
}

impl MemoryStore {
    pub fn new(data: StoreSnapshot) -> Self {
        Self { data }
    }

    pub fn data_mut(&mut self) -> &mut StoreSnapshot {
        &mut self.data
    }
}

impl ScheduleStore for MemoryStore {
    fn snapshot(&self, horizon: &Horizon) -> Result<StoreSnapshot> {
        Ok(self.data.clone().restrict_to(horizon))
    }
}

/// Store backed by a JSON snapshot file, re-read on every call.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScheduleStore for JsonFileStore {
    fn snapshot(&self, horizon: &Horizon) -> Result<StoreSnapshot> {
        debug!(path = %self.path.display(), "reading store snapshot");
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ScheduleError::DataAccess(format!("cannot read {}: {e}", self.path.display()))
        })?;
        let data: StoreSnapshot = serde_json::from_str(&content).map_err(|e| {
            ScheduleError::DataAccess(format!("malformed snapshot {}: {e}", self.path.display()))
        })?;
        Ok(data.restrict_to(horizon))
    }
}
