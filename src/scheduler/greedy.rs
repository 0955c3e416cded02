//! Greedy block-packing planner.
//!
//! # Algorithm
//!
//! 1. Sort open tasks by priority (descending), then deadline (ascending,
//!    missing deadlines last). The sort is stable, so equal tasks keep
//!    load order.
//! 2. Candidates per task: the originally-assigned actor first (if
//!    skill-qualified), then every other qualified actor in
//!    [`CandidateOrder`](crate::config::CandidateOrder).
//! 3. Walk days from horizon start to `min(horizon end, deadline)`,
//!    skipping non-working days, until the task is covered.
//! 4. Per day and candidate, merge contiguous free allowed slots into a
//!    block; at each gap and at the end of the day, try to commit it.
//! 5. A commit takes `min(block, continuity cap, remaining)` rounded down
//!    to the granularity, and must fit the weekly cap unless it is an
//!    authorized replacement.
//!
//! A block is committed at most once. Whatever is left of a block after
//! the continuity cap is not reused the same day, so two commits never
//! form a run longer than the cap.
//!
//! # Complexity
//! O(t * d * a * s) where t=tasks, d=days, a=candidates, s=slots/day.
//!
//! # Determinism
//! No randomness and no clock access: identical contexts yield identical
//! plans.

use chrono::{Datelike, NaiveDate};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::CandidateOrder;
use crate::context::Context;
use crate::interval::{round_down, Interval};
use crate::models::{Actor, Plan, PlannedAssignment, Task, WeekKey};
use crate::occupancy::OccupancyMap;

const PLAN_NOTES: &str = "greedy: priority then deadline, grid-aligned blocks within the \
continuity cap, weekly caps strict except authorized replacements, absences respected";

/// Result of a greedy pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GreedyOutcome {
    /// Proposed assignments in commit order.
    pub plan: Plan,
    /// Unplanned minutes per open task (zero when fully covered).
    pub remaining_minutes: BTreeMap<String, u32>,
}

impl GreedyOutcome {
    /// Tasks left partially or fully unplanned, with their shortfall.
    pub fn unplanned(&self) -> Vec<(&str, u32)> {
        self.remaining_minutes
            .iter()
            .filter(|(_, &m)| m > 0)
            .map(|(id, &m)| (id.as_str(), m))
            .collect()
    }

    /// Total unplanned minutes across all tasks.
    pub fn unplanned_minutes(&self) -> u32 {
        self.remaining_minutes.values().sum()
    }
}

/// Greedy priority-driven planner.
///
/// # Example
///
/// ```
/// use chrono::{NaiveDate, NaiveTime, Weekday};
/// use shift_planner::config::PlannerConfig;
/// use shift_planner::context::Context;
/// use shift_planner::models::{Actor, AvailabilityWindow, Horizon, Task};
/// use shift_planner::scheduler::GreedyPlanner;
///
/// let monday = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
/// let actor = Actor::new("E1").with_window(AvailabilityWindow::new(
///     Weekday::Mon,
///     NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
///     NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
/// ));
/// let ctx = Context::from_parts(
///     Horizon::new(monday, monday).unwrap(),
///     PlannerConfig::default(),
///     vec![actor],
///     vec![Task::new("T1", 3.0)],
///     vec![],
/// )
/// .unwrap();
///
/// let outcome = GreedyPlanner::new().plan(&ctx);
/// assert_eq!(outcome.plan.assignment_count(), 1);
/// assert_eq!(outcome.unplanned_minutes(), 0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GreedyPlanner;

impl GreedyPlanner {
    pub fn new() -> Self {
        Self
    }

    /// Runs one greedy pass over the context.
    pub fn plan(&self, ctx: &Context) -> GreedyOutcome {
        let mut state = PassState {
            occupancy: ctx.occupancy(),
            plan: Plan::new().with_notes(PLAN_NOTES),
            remaining: ctx
                .tasks()
                .iter()
                .map(|t| (t.id.clone(), t.required_minutes()))
                .collect(),
        };

        for task in sort_tasks(ctx.tasks()) {
            let candidates = candidates_for(ctx, task, &state.occupancy);
            if candidates.is_empty() {
                debug!(task = %task.id, "no qualified candidate");
                continue;
            }
            let deadline = task.effective_deadline(ctx.horizon().to);

            for day in ctx.horizon().days_until(deadline) {
                if state.remaining_for(task) == 0 {
                    break;
                }
                if !ctx.config().is_working_day(day.weekday()) {
                    continue;
                }
                for actor in &candidates {
                    if state.remaining_for(task) == 0 {
                        break;
                    }
                    if actor.is_absent_on(day) {
                        continue;
                    }
                    state.pack_day(ctx, task, actor, day);
                }
            }
        }

        let outcome = GreedyOutcome {
            plan: state.plan,
            remaining_minutes: state.remaining,
        };
        info!(
            assignments = outcome.plan.assignment_count(),
            unplanned_minutes = outcome.unplanned_minutes(),
            "greedy pass finished"
        );
        outcome
    }
}

/// Mutable bookkeeping of a single pass.
struct PassState {
    occupancy: OccupancyMap,
    plan: Plan,
    remaining: BTreeMap<String, u32>,
}

impl PassState {
    fn remaining_for(&self, task: &Task) -> u32 {
        self.remaining.get(&task.id).copied().unwrap_or(0)
    }

    /// Scans one actor-day, committing each contiguous free block.
    fn pack_day(&mut self, ctx: &Context, task: &Task, actor: &Actor, day: NaiveDate) {
        let mut block: Option<Interval> = None;

        for slot in ctx.allowed_slots(&actor.id, day) {
            if !self.occupancy.is_free(&actor.id, day, slot) {
                if let Some(b) = block.take() {
                    self.try_commit(ctx, task, actor, day, b);
                }
                continue;
            }
            block = match block {
                Some(mut b) if b.end_min == slot.start_min => {
                    b.end_min = slot.end_min;
                    Some(b)
                }
                Some(b) => {
                    self.try_commit(ctx, task, actor, day, b);
                    Some(*slot)
                }
                None => Some(*slot),
            };
        }

        if let Some(b) = block {
            self.try_commit(ctx, task, actor, day, b);
        }
    }

    /// Commits the head of `block` if the length and weekly rules allow.
    fn try_commit(
        &mut self,
        ctx: &Context,
        task: &Task,
        actor: &Actor,
        day: NaiveDate,
        block: Interval,
    ) -> bool {
        let config = ctx.config();
        let granularity = config.granularity_minutes;
        let remaining = self.remaining_for(task);

        let length = round_down(
            block
                .duration_min()
                .min(config.max_continuous_minutes())
                .min(remaining),
            granularity,
        );
        if length < granularity {
            return false;
        }

        let week = WeekKey::of(day);
        let used = self.occupancy.minutes_in_week(&actor.id, week);
        if f64::from(used + length) > actor.weekly_cap_minutes() {
            if !replacement_allowed(ctx, task, actor) {
                debug!(
                    task = %task.id,
                    actor = %actor.id,
                    %day,
                    %week,
                    used,
                    length,
                    "block skipped: weekly cap"
                );
                return false;
            }
            debug!(task = %task.id, actor = %actor.id, %week, "weekly cap exceeded by authorized replacement");
        }

        let interval = Interval::new(block.start_min, block.start_min + length);
        self.plan.add_assignment(PlannedAssignment::new(
            actor.id.clone(),
            task.id.clone(),
            day,
            interval.start_time(),
            interval.end_time(),
        ));
        self.occupancy.insert(&actor.id, day, interval);
        if let Some(r) = self.remaining.get_mut(&task.id) {
            *r -= length;
        }
        debug!(task = %task.id, actor = %actor.id, %day, %interval, "block committed");
        true
    }
}

/// Whether `actor` may exceed its weekly cap for `task`.
///
/// Only replacements qualify, and only when the replacing actor accepts
/// replacement work or the originally-assigned actor accepts being
/// replaced.
fn replacement_allowed(ctx: &Context, task: &Task, actor: &Actor) -> bool {
    if !task.is_replacement_for(&actor.id) {
        return false;
    }
    let owner_accepts = task
        .assigned_to
        .as_deref()
        .and_then(|id| ctx.actor(id))
        .is_some_and(|owner| owner.accept_replacement);
    actor.accept_replacement || owner_accepts
}

/// Tasks by priority descending, then deadline ascending (none last).
fn sort_tasks(tasks: &[Task]) -> Vec<&Task> {
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| match (a.deadline, b.deadline) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
    sorted
}

/// Qualified actors for a task, preferred actor first.
fn candidates_for<'a>(ctx: &'a Context, task: &Task, occupancy: &OccupancyMap) -> Vec<&'a Actor> {
    let preferred = task
        .assigned_to
        .as_deref()
        .and_then(|id| ctx.actor(id))
        .filter(|a| a.is_qualified_for(&task.required_skills));

    let mut others: Vec<&Actor> = ctx
        .actors()
        .iter()
        .filter(|a| task.assigned_to.as_deref() != Some(a.id.as_str()))
        .filter(|a| a.is_qualified_for(&task.required_skills))
        .collect();

    if ctx.config().candidate_order == CandidateOrder::FewestCommittedHours {
        others.sort_by_key(|a| occupancy.total_minutes(&a.id));
    }

    preferred.into_iter().chain(others).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlannerConfig;
    use crate::models::{Absence, AvailabilityWindow, ExistingAssignment, Horizon, Priority};
    use chrono::{NaiveTime, Weekday};

    fn d(day: u32) -> NaiveDate {
        // March 2025: the 10th is a Monday
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn window(day: Weekday, from: u32, to: u32) -> AvailabilityWindow {
        AvailabilityWindow::new(day, t(from, 0), t(to, 0))
    }

    fn ctx(actors: Vec<Actor>, tasks: Vec<Task>) -> Context {
        ctx_with(actors, tasks, vec![], PlannerConfig::default(), d(10), d(16))
    }

    fn ctx_with(
        actors: Vec<Actor>,
        tasks: Vec<Task>,
        existing: Vec<ExistingAssignment>,
        config: PlannerConfig,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Context {
        Context::from_parts(Horizon::new(from, to).unwrap(), config, actors, tasks, existing)
            .unwrap()
    }

    fn spans(plan: &Plan) -> Vec<(String, String, NaiveDate, String)> {
        plan.assignments
            .iter()
            .map(|a| {
                (
                    a.actor_id.clone(),
                    a.task_id.clone(),
                    a.date,
                    a.interval().to_string(),
                )
            })
            .collect()
    }

    #[test]
    fn test_single_block() {
        let c = ctx(
            vec![Actor::new("E1").with_window(window(Weekday::Mon, 9, 13))],
            vec![Task::new("T1", 3.0)],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(
            spans(&out.plan),
            vec![("E1".into(), "T1".into(), d(10), "09:00-12:00".into())]
        );
        assert_eq!(out.remaining_minutes["T1"], 0);
        assert!(out.unplanned().is_empty());
    }

    #[test]
    fn test_continuity_cap_splits_across_days() {
        let c = ctx(
            vec![Actor::new("E1")
                .with_window(window(Weekday::Mon, 8, 18))
                .with_window(window(Weekday::Tue, 8, 18))],
            vec![Task::new("T1", 8.0)],
        );
        let out = GreedyPlanner::new().plan(&c);
        // 6h on Monday; the 4h tail of Monday's block is not reused
        assert_eq!(
            spans(&out.plan),
            vec![
                ("E1".into(), "T1".into(), d(10), "08:00-14:00".into()),
                ("E1".into(), "T1".into(), d(11), "08:00-10:00".into()),
            ]
        );
    }

    #[test]
    fn test_gap_splits_blocks() {
        let c = ctx(
            vec![Actor::new("E1")
                .with_window(window(Weekday::Mon, 8, 10))
                .with_window(window(Weekday::Mon, 14, 16))],
            vec![Task::new("T1", 3.0)],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(
            spans(&out.plan),
            vec![
                ("E1".into(), "T1".into(), d(10), "08:00-10:00".into()),
                ("E1".into(), "T1".into(), d(10), "14:00-15:00".into()),
            ]
        );
    }

    #[test]
    fn test_priority_then_deadline_order() {
        let c = ctx(
            vec![Actor::new("E1").with_window(window(Weekday::Mon, 9, 12))],
            vec![
                Task::new("low", 1.0).with_priority(Priority::Low),
                Task::new("late", 1.0).with_priority(Priority::High).with_deadline(d(16)),
                Task::new("nodl", 1.0).with_priority(Priority::High),
                Task::new("soon", 1.0).with_priority(Priority::High).with_deadline(d(10)),
            ],
        );
        let out = GreedyPlanner::new().plan(&c);
        let order: Vec<&str> = out.plan.assignments.iter().map(|a| a.task_id.as_str()).collect();
        assert_eq!(order, vec!["soon", "late", "nodl"]);
        assert_eq!(out.remaining_minutes["low"], 60);
        assert_eq!(out.unplanned(), vec![("low", 60)]);
    }

    #[test]
    fn test_skill_mismatch_not_assigned() {
        let c = ctx(
            vec![Actor::new("E1").with_window(window(Weekday::Mon, 9, 17))],
            vec![Task::new("T1", 2.0).with_skill("X")],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert!(out.plan.is_empty());
        assert_eq!(out.remaining_minutes["T1"], 120);
    }

    #[test]
    fn test_preferred_actor_first() {
        let c = ctx(
            vec![
                Actor::new("E1").with_window(window(Weekday::Mon, 9, 17)),
                Actor::new("E2").with_window(window(Weekday::Mon, 9, 17)),
            ],
            vec![Task::new("T1", 2.0).with_assignee("E2")],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(out.plan.assignments[0].actor_id, "E2");
    }

    #[test]
    fn test_unqualified_preferred_actor_skipped() {
        let c = ctx(
            vec![
                Actor::new("E1").with_window(window(Weekday::Mon, 9, 17)).with_skill("X"),
                Actor::new("E2").with_window(window(Weekday::Mon, 9, 17)),
            ],
            vec![Task::new("T1", 2.0).with_skill("X").with_assignee("E2")],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(out.plan.assignments[0].actor_id, "E1");
    }

    #[test]
    fn test_weekly_cap_skips_block() {
        let existing = vec![ExistingAssignment::new("E1", "T0", d(10), t(8, 0), t(17, 0))];
        let c = ctx_with(
            vec![Actor::new("E1")
                .with_weekly_hours(10.0)
                .with_window(window(Weekday::Mon, 8, 17))
                .with_window(window(Weekday::Tue, 8, 17))],
            vec![Task::new("T1", 2.0)],
            existing,
            PlannerConfig::default(),
            d(10),
            d(16),
        );
        let out = GreedyPlanner::new().plan(&c);
        assert!(out.plan.is_empty());
        assert_eq!(out.remaining_minutes["T1"], 120);
    }

    #[test]
    fn test_weekly_cap_resets_next_iso_week() {
        let existing = vec![ExistingAssignment::new("E1", "T0", d(10), t(8, 0), t(17, 0))];
        let c = ctx_with(
            vec![Actor::new("E1")
                .with_weekly_hours(10.0)
                .with_window(window(Weekday::Mon, 8, 17))],
            vec![Task::new("T1", 2.0)],
            existing,
            PlannerConfig::default(),
            d(10),
            d(17),
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(
            spans(&out.plan),
            vec![("E1".into(), "T1".into(), d(17), "08:00-10:00".into())]
        );
    }

    #[test]
    fn test_replacement_may_exceed_cap() {
        let existing = vec![ExistingAssignment::new("E2", "T0", d(10), t(8, 0), t(12, 0))];
        let c = ctx_with(
            vec![
                Actor::new("E1").with_replacement(true),
                Actor::new("E2")
                    .with_weekly_hours(5.0)
                    .with_window(window(Weekday::Mon, 8, 17)),
            ],
            vec![Task::new("T1", 2.0).with_assignee("E1")],
            existing,
            PlannerConfig::default(),
            d(10),
            d(16),
        );
        let out = GreedyPlanner::new().plan(&c);
        // Owner E1 accepts being replaced, so E2 exceeds its 5h cap
        assert_eq!(
            spans(&out.plan),
            vec![("E2".into(), "T1".into(), d(10), "12:00-14:00".into())]
        );
    }

    #[test]
    fn test_non_replacement_respects_cap_even_if_flagged() {
        let existing = vec![ExistingAssignment::new("E1", "T0", d(10), t(8, 0), t(12, 0))];
        let c = ctx_with(
            vec![Actor::new("E1")
                .with_replacement(true)
                .with_weekly_hours(5.0)
                .with_window(window(Weekday::Mon, 8, 17))],
            vec![Task::new("T1", 2.0)],
            existing,
            PlannerConfig::default(),
            d(10),
            d(16),
        );
        assert!(GreedyPlanner::new().plan(&c).plan.is_empty());
    }

    #[test]
    fn test_deadline_bounds_days() {
        let c = ctx(
            vec![Actor::new("E1")
                .with_window(window(Weekday::Mon, 9, 11))
                .with_window(window(Weekday::Tue, 9, 11))],
            vec![Task::new("T1", 4.0).with_deadline(d(10))],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(out.plan.planned_minutes_for_task("T1"), 120);
        assert_eq!(out.remaining_minutes["T1"], 120);
    }

    #[test]
    fn test_non_working_day_skipped() {
        let config = PlannerConfig::default().with_working_days(vec![Weekday::Tue]);
        let c = ctx_with(
            vec![Actor::new("E1")
                .with_window(window(Weekday::Mon, 9, 11))
                .with_window(window(Weekday::Tue, 9, 11))],
            vec![Task::new("T1", 1.0)],
            vec![],
            config,
            d(10),
            d(16),
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(out.plan.assignments[0].date, d(11));
    }

    #[test]
    fn test_absent_actor_skipped() {
        let c = ctx(
            vec![
                Actor::new("E1")
                    .with_window(window(Weekday::Mon, 9, 17))
                    .with_absence(Absence::new(d(10), d(10))),
                Actor::new("E2").with_window(window(Weekday::Mon, 9, 17)),
            ],
            vec![Task::new("T1", 1.0)],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(out.plan.assignments[0].actor_id, "E2");
    }

    #[test]
    fn test_no_double_booking_across_tasks() {
        let c = ctx(
            vec![Actor::new("E1").with_window(window(Weekday::Mon, 9, 13))],
            vec![
                Task::new("A", 2.0).with_priority(Priority::High),
                Task::new("B", 2.0),
            ],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(
            spans(&out.plan),
            vec![
                ("E1".into(), "A".into(), d(10), "09:00-11:00".into()),
                ("E1".into(), "B".into(), d(10), "11:00-13:00".into()),
            ]
        );
    }

    #[test]
    fn test_sub_granularity_remainder_left_unplanned() {
        let c = ctx(
            vec![Actor::new("E1").with_window(window(Weekday::Mon, 9, 13))],
            vec![Task::new("T1", 1.25)],
        );
        let out = GreedyPlanner::new().plan(&c);
        assert_eq!(out.plan.planned_minutes_for_task("T1"), 60);
        assert_eq!(out.remaining_minutes["T1"], 15);
    }

    #[test]
    fn test_fewest_committed_hours_order() {
        let existing = vec![ExistingAssignment::new("E1", "T0", d(10), t(8, 0), t(10, 0))];
        let config = PlannerConfig::default().with_candidate_order(CandidateOrder::FewestCommittedHours);
        let actors = vec![
            Actor::new("E1").with_window(window(Weekday::Mon, 10, 17)),
            Actor::new("E2").with_window(window(Weekday::Mon, 10, 17)),
        ];
        let tasks = vec![Task::new("T1", 1.0)];

        let by_load = ctx_with(actors.clone(), tasks.clone(), existing.clone(), PlannerConfig::default(), d(10), d(16));
        assert_eq!(GreedyPlanner::new().plan(&by_load).plan.assignments[0].actor_id, "E1");

        let fair = ctx_with(actors, tasks, existing, config, d(10), d(16));
        assert_eq!(GreedyPlanner::new().plan(&fair).plan.assignments[0].actor_id, "E2");
    }

    #[test]
    fn test_deterministic() {
        let make = || {
            ctx(
                vec![
                    Actor::new("E1").with_window(window(Weekday::Mon, 8, 16)),
                    Actor::new("E2").with_window(window(Weekday::Tue, 8, 16)),
                ],
                vec![
                    Task::new("T1", 5.0).with_priority(Priority::Critical),
                    Task::new("T2", 7.0),
                    Task::new("T3", 3.0).with_deadline(d(11)),
                ],
            )
        };
        let a = GreedyPlanner::new().plan(&make());
        let b = GreedyPlanner::new().plan(&make());
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_input() {
        let out = GreedyPlanner::new().plan(&ctx(vec![], vec![]));
        assert!(out.plan.is_empty());
        assert_eq!(out.unplanned_minutes(), 0);
    }
}
