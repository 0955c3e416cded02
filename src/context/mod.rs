//! Planning context.
//!
//! A [`Context`] is the immutable input of one planning run: actors with
//! resolved skills and availability, open tasks, pre-existing assignments
//! inside the horizon, and the derived allowed slots per actor and date.
//!
//! # Allowed slots
//! For each actor and date:
//! 1. no slots if an approved absence covers the date;
//! 2. otherwise take the (merged) availability windows for the weekday,
//! 3. subtract pre-existing occupancy,
//! 4. quantize the free parts onto the granularity grid.

mod store;

pub use store::{
    AbsenceRecord, AbsenceStatus, ActorRecord, ActorSkillRecord, AvailabilityRecord,
    JsonFileStore, MemoryStore, ScheduleStore, StoreSnapshot, TaskRecord, TaskSkillRecord,
};

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::error::{Result, ScheduleError};
use crate::interval::{quantize, subtract, Interval};
use crate::models::{
    Absence, Actor, AvailabilityWindow, ExistingAssignment, Horizon, Task,
};
use crate::occupancy::OccupancyMap;

/// Immutable input of a planning run.
#[derive(Debug, Clone)]
pub struct Context {
    horizon: Horizon,
    config: PlannerConfig,
    actors: Vec<Actor>,
    tasks: Vec<Task>,
    existing: Vec<ExistingAssignment>,
    allowed: BTreeMap<(String, NaiveDate), Vec<Interval>>,
    actor_index: HashMap<String, usize>,
    task_index: HashMap<String, usize>,
}

impl Context {
    /// Assembles a context from already-resolved parts.
    ///
    /// Tasks that are not open are dropped and existing assignments are
    /// restricted to the horizon.
    pub fn from_parts(
        horizon: Horizon,
        config: PlannerConfig,
        actors: Vec<Actor>,
        tasks: Vec<Task>,
        existing: Vec<ExistingAssignment>,
    ) -> Result<Self> {
        config.validate()?;

        let mut actor_index = HashMap::with_capacity(actors.len());
        for (i, a) in actors.iter().enumerate() {
            if actor_index.insert(a.id.clone(), i).is_some() {
                return Err(ScheduleError::DataAccess(format!("duplicate actor id: {}", a.id)));
            }
        }

        let tasks: Vec<Task> = tasks.into_iter().filter(|t| t.status.is_open()).collect();
        let mut task_index = HashMap::with_capacity(tasks.len());
        for (i, t) in tasks.iter().enumerate() {
            if task_index.insert(t.id.clone(), i).is_some() {
                return Err(ScheduleError::DataAccess(format!("duplicate task id: {}", t.id)));
            }
        }

        let existing: Vec<ExistingAssignment> = existing
            .into_iter()
            .filter(|e| horizon.contains(e.date))
            .collect();

        let allowed = derive_allowed_slots(&horizon, config.granularity_minutes, &actors, &existing);

        Ok(Self {
            horizon,
            config,
            actors,
            tasks,
            existing,
            allowed,
            actor_index,
            task_index,
        })
    }

    pub fn horizon(&self) -> &Horizon {
        &self.horizon
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Actors in load order.
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Open tasks in load order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Pre-existing assignments inside the horizon.
    pub fn existing(&self) -> &[ExistingAssignment] {
        &self.existing
    }

    pub fn actor(&self, id: &str) -> Option<&Actor> {
        self.actor_index.get(id).map(|&i| &self.actors[i])
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.task_index.get(id).map(|&i| &self.tasks[i])
    }

    /// Allowed slots for an actor on a date, in time order.
    pub fn allowed_slots(&self, actor_id: &str, date: NaiveDate) -> &[Interval] {
        self.allowed
            .get(&(actor_id.to_string(), date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Total number of allowed slots across all actors and dates.
    pub fn allowed_slot_count(&self) -> usize {
        self.allowed.values().map(Vec::len).sum()
    }

    /// Fresh occupancy map seeded with the pre-existing assignments.
    pub fn occupancy(&self) -> OccupancyMap {
        OccupancyMap::from_existing(&self.existing)
    }
}

/// Derives every allowed slot per actor and date.
fn derive_allowed_slots(
    horizon: &Horizon,
    granularity_min: u32,
    actors: &[Actor],
    existing: &[ExistingAssignment],
) -> BTreeMap<(String, NaiveDate), Vec<Interval>> {
    let occupancy = OccupancyMap::from_existing(existing);
    let mut allowed = BTreeMap::new();

    for date in horizon.days() {
        let weekday = date.weekday();
        for actor in actors {
            if actor.is_absent_on(date) {
                continue;
            }
            let occupied = occupancy.intervals(&actor.id, date);
            let slots: Vec<Interval> = actor
                .windows_on(weekday)
                .iter()
                .flat_map(|w| subtract(w, occupied))
                .flat_map(|free| quantize(&free, granularity_min))
                .collect();
            if !slots.is_empty() {
                allowed.insert((actor.id.clone(), date), slots);
            }
        }
    }
    allowed
}

/// Builds a [`Context`] from a data store.
#[derive(Debug, Clone, Default)]
pub struct ContextBuilder {
    config: PlannerConfig,
}

impl ContextBuilder {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Reads one snapshot from `store` and resolves it for `horizon`.
    ///
    /// # Errors
    /// Store failures and rows referencing unknown actors or tasks are
    /// fatal for the run.
    pub fn build(&self, store: &dyn ScheduleStore, horizon: Horizon) -> Result<Context> {
        let snapshot = store.snapshot(&horizon)?;
        self.resolve(snapshot, horizon)
    }

    /// Joins relational rows into domain models.
    pub fn resolve(&self, snapshot: StoreSnapshot, horizon: Horizon) -> Result<Context> {
        let StoreSnapshot {
            actors: actor_rows,
            actor_skills,
            availability,
            absences,
            tasks: task_rows,
            task_skills,
            assignments,
        } = snapshot;

        let mut actors: Vec<Actor> = actor_rows
            .into_iter()
            .map(|r| {
                Actor::new(r.id)
                    .with_name(r.name)
                    .with_weekly_hours(r.weekly_hours_max)
                    .with_replacement(r.accept_replacement)
            })
            .collect();
        let actor_pos: HashMap<String, usize> = actors
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        let lookup_actor = |id: &str| {
            actor_pos
                .get(id)
                .copied()
                .ok_or_else(|| ScheduleError::MissingEntity {
                    entity: "actor",
                    id: id.to_string(),
                })
        };

        for row in actor_skills {
            let i = lookup_actor(&row.actor_id)?;
            actors[i].skills.insert(row.skill_id);
        }

        let mut skipped_windows = 0usize;
        for row in availability {
            let i = lookup_actor(&row.actor_id)?;
            if row.end <= row.start {
                warn!(
                    actor = %row.actor_id,
                    weekday = %row.weekday,
                    "ignoring availability window ending before it starts"
                );
                skipped_windows += 1;
                continue;
            }
            actors[i]
                .availability
                .push(AvailabilityWindow::new(row.weekday, row.start, row.end));
        }

        for row in absences {
            let i = lookup_actor(&row.actor_id)?;
            if row.status == AbsenceStatus::Approved {
                actors[i]
                    .absences
                    .push(Absence::new(row.start_date, row.end_date));
            }
        }

        let mut tasks: Vec<Task> = task_rows
            .into_iter()
            .map(|r| {
                let mut task = Task::new(r.id, r.duration_hours)
                    .with_title(r.title)
                    .with_priority(r.priority)
                    .with_status(r.status);
                task.deadline = r.deadline;
                task.assigned_to = r.assigned_to;
                task
            })
            .collect();
        let task_pos: HashMap<String, usize> = tasks
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        for row in task_skills {
            let i = task_pos
                .get(&row.task_id)
                .copied()
                .ok_or_else(|| ScheduleError::MissingEntity {
                    entity: "task",
                    id: row.task_id.clone(),
                })?;
            tasks[i].required_skills.insert(row.skill_id);
        }
        for task in &tasks {
            if let Some(owner) = &task.assigned_to {
                if !actor_pos.contains_key(owner) {
                    warn!(task = %task.id, actor = %owner, "task assigned to unknown actor");
                }
            }
        }

        let existing: Vec<ExistingAssignment> = assignments
            .into_iter()
            .filter(|a| {
                let known = actor_pos.contains_key(&a.actor_id);
                if !known {
                    warn!(actor = %a.actor_id, date = %a.date, "ignoring assignment of unknown actor");
                }
                known
            })
            .collect();

        let context = Context::from_parts(horizon, self.config.clone(), actors, tasks, existing)?;
        info!(
            actors = context.actors().len(),
            open_tasks = context.tasks().len(),
            existing = context.existing().len(),
            slots = context.allowed_slot_count(),
            skipped_windows,
            "planning context built"
        );
        debug!(from = %horizon.from, to = %horizon.to, "context horizon");
        Ok(context)
    }
}
