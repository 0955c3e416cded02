//! Plan quality metrics (KPIs).
//!
//! Computes coverage indicators from a proposed plan and the context it
//! was built against. Metrics are informational; hard constraints are the
//! validator's job.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Planned minutes | Sum of assignment durations |
//! | Coverage rate | Planned / required minutes, capped per task |
//! | Deadline-met rate | Fraction of tasks fully planned by their deadline |
//! | Unplanned minutes | Per-task shortfall against required minutes |
//! | Actor load | Planned minutes per actor |
//! | Replacements | Assignments to an actor other than the owner |

use std::collections::BTreeMap;

use crate::context::Context;
use crate::models::Plan;

/// Plan performance indicators. All durations are in minutes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanKpi {
    /// Total minutes across all assignments.
    pub planned_minutes: u32,
    /// Total minutes required by open tasks.
    pub required_minutes: u32,
    /// Required minutes actually covered (0.0..1.0). Over-planning a task
    /// does not compensate for another.
    pub coverage_rate: f64,
    /// Fraction of open tasks fully planned on or before their deadline.
    pub deadline_met_rate: f64,
    /// Shortfall per open task (zero when covered).
    pub unplanned_by_task: BTreeMap<String, u32>,
    /// Planned minutes per actor.
    pub minutes_by_actor: BTreeMap<String, u32>,
    /// Assignments that replace the task's original assignee.
    pub replacement_count: usize,
}

impl PlanKpi {
    /// Computes KPIs for `plan` against the tasks in `ctx`.
    pub fn calculate(plan: &Plan, ctx: &Context) -> Self {
        let horizon_end = ctx.horizon().to;
        let mut required_total: u32 = 0;
        let mut covered_total: u32 = 0;
        let mut met_count: usize = 0;
        let mut unplanned_by_task = BTreeMap::new();

        for task in ctx.tasks() {
            let required = task.required_minutes();
            let deadline = task.effective_deadline(horizon_end);
            let planned = plan.planned_minutes_for_task(&task.id);
            let by_deadline: u32 = plan
                .assignments_for_task(&task.id)
                .into_iter()
                .filter(|a| a.date <= deadline)
                .map(|a| a.duration_min())
                .sum();

            required_total += required;
            covered_total += planned.min(required);
            if by_deadline >= required {
                met_count += 1;
            }
            unplanned_by_task.insert(task.id.clone(), required.saturating_sub(planned));
        }

        let mut minutes_by_actor: BTreeMap<String, u32> = BTreeMap::new();
        let mut replacement_count = 0;
        for a in &plan.assignments {
            *minutes_by_actor.entry(a.actor_id.clone()).or_default() += a.duration_min();
            if ctx.task(&a.task_id).is_some_and(|t| t.is_replacement_for(&a.actor_id)) {
                replacement_count += 1;
            }
        }

        let coverage_rate = if required_total == 0 {
            1.0
        } else {
            f64::from(covered_total) / f64::from(required_total)
        };

        let task_count = ctx.tasks().len();
        let deadline_met_rate = if task_count == 0 {
            1.0
        } else {
            met_count as f64 / task_count as f64
        };

        Self {
            planned_minutes: plan.assignments.iter().map(|a| a.duration_min()).sum(),
            required_minutes: required_total,
            coverage_rate,
            deadline_met_rate,
            unplanned_by_task,
            minutes_by_actor,
            replacement_count,
        }
    }

    /// Total shortfall across tasks.
    pub fn unplanned_minutes(&self) -> u32 {
        self.unplanned_by_task.values().sum()
    }

    /// Whether the plan meets the given quality thresholds.
    pub fn meets_thresholds(&self, min_coverage: f64, min_deadline_met: f64) -> bool {
        self.coverage_rate >= min_coverage && self.deadline_met_rate >= min_deadline_met
    }
}
