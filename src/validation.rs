//! Plan validation.
//!
//! Re-derives every constraint violation of a candidate plan against its
//! context, independently of how the plan was produced. Nothing about
//! entry order or prior construction is trusted.
//!
//! Per-entry checks, in order:
//! 1. End after start, on whole minutes (malformed entries skip all
//!    further checks)
//! 2. Date inside the horizon
//! 3. Weekday is a working day
//! 4. Task and actor exist (missing references skip further checks)
//! 5. Actor holds every required skill
//! 6. Interval lies within one availability window for the weekday
//! 7. No approved absence covers the date (only checked when 6 passed)
//! 8. Duration within the continuity cap
//! 9. No overlap with existing assignments or earlier entries
//!
//! Aggregate checks then flag deadline shortfalls and weekly-cap overruns
//! as warnings. Weekly overruns may be authorized replacements, which is
//! a reviewer decision, so they never block.

use chrono::Datelike;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::context::Context;
use crate::error::Result;
use crate::interval::is_aligned;
use crate::models::wire::is_whole_minute;
use crate::models::{Plan, PlannedAssignment, WeekKey};

/// Categories of findings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FindingKind {
    /// End time not after start time, or a time with seconds.
    MalformedInterval,
    /// Date outside the planning horizon.
    OutsideHorizon,
    /// Date falls on a non-working weekday.
    NonWorkingDay,
    /// Task unknown or not open.
    UnknownTask,
    /// Actor unknown.
    UnknownActor,
    /// Actor lacks a required skill.
    MissingSkill,
    /// Interval not inside an availability window.
    OutsideAvailability,
    /// Actor on approved absence that date.
    Absent,
    /// Interval longer than the continuity cap.
    ContinuityExceeded,
    /// Interval overlaps another commitment of the same actor.
    Overlap,
    /// Start or end off the granularity grid.
    Misaligned,
    /// Task not fully planned by its deadline.
    DeadlineShortfall,
    /// Actor's weekly total above its cap.
    WeeklyOverrun,
}

impl FindingKind {
    /// Whether findings of this kind block commit.
    pub fn is_error(self) -> bool {
        !matches!(
            self,
            Self::Misaligned | Self::DeadlineShortfall | Self::WeeklyOverrun
        )
    }
}

/// A single human-readable finding.
///
/// Serializes as its message alone, so a report renders as two string
/// lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Serialize for Finding {
    fn serialize<S: Serializer>(&self, s: S) -> std::result::Result<S::Ok, S::Error> {
        s.serialize_str(&self.message)
    }
}

/// Outcome of validating one plan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    /// Blocking findings.
    pub errors: Vec<Finding>,
    /// Advisory findings for the reviewer.
    pub warnings: Vec<Finding>,
}

impl ValidationReport {
    fn push(&mut self, finding: Finding) {
        if finding.kind.is_error() {
            self.errors.push(finding);
        } else {
            self.warnings.push(finding);
        }
    }

    /// No errors and no warnings.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Findings of one kind, errors first.
    pub fn findings_of(&self, kind: FindingKind) -> Vec<&Finding> {
        self.errors
            .iter()
            .chain(&self.warnings)
            .filter(|f| f.kind == kind)
            .collect()
    }

    /// Renders `{"errors": [...], "warnings": [...]}`.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

fn describe(a: &PlannedAssignment) -> String {
    format!(
        "{} on task {} at {} {}",
        a.actor_id,
        a.task_id,
        a.date,
        a.interval()
    )
}

/// Validates `plan` against `ctx`.
///
/// The occupancy used for overlap detection starts from the context's
/// pre-existing assignments, and weekly totals include them.
pub fn validate_plan(ctx: &Context, plan: &Plan) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut occupancy = ctx.occupancy();
    let config = ctx.config();
    let granularity = config.granularity_minutes;
    let cap = config.max_continuous_minutes();

    for a in &plan.assignments {
        if a.end <= a.start {
            report.push(Finding::new(
                FindingKind::MalformedInterval,
                format!(
                    "{} on task {} at {}: end {} is not after start {}",
                    a.actor_id,
                    a.task_id,
                    a.date,
                    a.end.format("%H:%M"),
                    a.start.format("%H:%M")
                ),
            ));
            continue;
        }
        if !is_whole_minute(&a.start) || !is_whole_minute(&a.end) {
            report.push(Finding::new(
                FindingKind::MalformedInterval,
                format!(
                    "{} on task {} at {}: {}-{} is not on whole minutes",
                    a.actor_id, a.task_id, a.date, a.start, a.end
                ),
            ));
            continue;
        }

        let what = describe(a);
        let interval = a.interval();
        let weekday = a.date.weekday();

        if !ctx.horizon().contains(a.date) {
            report.push(Finding::new(
                FindingKind::OutsideHorizon,
                format!(
                    "{what}: date outside horizon {} to {}",
                    ctx.horizon().from,
                    ctx.horizon().to
                ),
            ));
        }
        if !config.is_working_day(weekday) {
            report.push(Finding::new(
                FindingKind::NonWorkingDay,
                format!("{what}: {weekday} is not a working day"),
            ));
        }

        let task = ctx.task(&a.task_id);
        let actor = ctx.actor(&a.actor_id);
        if task.is_none() {
            report.push(Finding::new(
                FindingKind::UnknownTask,
                format!("{what}: task {} is unknown or not open", a.task_id),
            ));
        }
        if actor.is_none() {
            report.push(Finding::new(
                FindingKind::UnknownActor,
                format!("{what}: actor {} is unknown", a.actor_id),
            ));
        }
        let (Some(task), Some(actor)) = (task, actor) else {
            continue;
        };

        let missing = actor.missing_skills(&task.required_skills);
        if !missing.is_empty() {
            report.push(Finding::new(
                FindingKind::MissingSkill,
                format!("{what}: actor lacks required skills {}", missing.join(", ")),
            ));
        }

        let available = actor
            .windows_on(weekday)
            .iter()
            .any(|w| w.contains(&interval));
        if !available {
            report.push(Finding::new(
                FindingKind::OutsideAvailability,
                format!("{what}: outside the actor's availability on {weekday}"),
            ));
        } else if actor.is_absent_on(a.date) {
            report.push(Finding::new(
                FindingKind::Absent,
                format!("{what}: actor is on approved absence"),
            ));
        }

        if interval.duration_min() > cap {
            report.push(Finding::new(
                FindingKind::ContinuityExceeded,
                format!(
                    "{what}: {} minutes exceeds the continuous limit of {cap} minutes",
                    interval.duration_min()
                ),
            ));
        }

        if !occupancy.is_free(&a.actor_id, a.date, &interval) {
            report.push(Finding::new(
                FindingKind::Overlap,
                format!("{what}: overlaps another assignment of the same actor"),
            ));
        }
        occupancy.insert(&a.actor_id, a.date, interval);

        if !is_aligned(&interval, granularity) {
            report.push(Finding::new(
                FindingKind::Misaligned,
                format!("{what}: not aligned to the {granularity}-minute grid"),
            ));
        }
    }

    check_deadlines(ctx, plan, &mut report);
    check_weekly_totals(ctx, plan, &mut report);

    info!(
        entries = plan.assignment_count(),
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "plan validated"
    );
    report
}

/// Warns for tasks with an explicit deadline not fully planned by it.
fn check_deadlines(ctx: &Context, plan: &Plan, report: &mut ValidationReport) {
    for task in ctx.tasks() {
        let Some(deadline) = task.deadline else {
            continue;
        };
        let required = task.required_minutes();
        let planned: u32 = plan
            .assignments_for_task(&task.id)
            .into_iter()
            .filter(|a| a.date <= deadline)
            .map(|a| a.duration_min())
            .sum();
        if planned < required {
            let short = f64::from(required - planned) / 60.0;
            debug!(task = %task.id, planned, required, "deadline shortfall");
            report.push(Finding::new(
                FindingKind::DeadlineShortfall,
                format!(
                    "task {}: {short:.2}h still unplanned by deadline {deadline}",
                    task.id
                ),
            ));
        }
    }
}

/// Warns for actor-weeks the plan touches whose total (existing plus
/// planned) exceeds the cap.
fn check_weekly_totals(ctx: &Context, plan: &Plan, report: &mut ValidationReport) {
    let mut totals: BTreeMap<(&str, WeekKey), u32> = BTreeMap::new();
    for a in &plan.assignments {
        if let Some(actor) = ctx.actor(&a.actor_id) {
            *totals
                .entry((actor.id.as_str(), WeekKey::of(a.date)))
                .or_default() += a.duration_min();
        }
    }
    for e in ctx.existing() {
        if let Some(minutes) = totals.get_mut(&(e.actor_id.as_str(), WeekKey::of(e.date))) {
            *minutes += e.interval().duration_min();
        }
    }

    for ((actor_id, week), minutes) in totals {
        let Some(actor) = ctx.actor(actor_id) else {
            continue;
        };
        if f64::from(minutes) > actor.weekly_cap_minutes() {
            report.push(Finding::new(
                FindingKind::WeeklyOverrun,
                format!(
                    "actor {actor_id}: {:.2}h in week {week} exceeds the {:.2}h cap; \
                     confirm the excess is an authorized replacement",
                    f64::from(minutes) / 60.0,
                    actor.weekly_hours_max
                ),
            ));
        }
    }
}
