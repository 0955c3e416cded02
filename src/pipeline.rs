//! One planning run: context, plan source(s), validation.
//!
//! Sources are tried in order and the first non-empty proposal wins, so
//! an external proposer that yields nothing falls back to the heuristic.
//! Whatever is chosen is validated; only an error-free report makes the
//! plan committable. Persisting it is left to the caller.

use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::context::{Context, ContextBuilder, ScheduleStore};
use crate::error::Result;
use crate::models::{Horizon, Plan};
use crate::scheduler::{HeuristicPlanner, PlanKpi, PlanSource};
use crate::validation::{validate_plan, ValidationReport};

/// Result of a planning run.
#[derive(Debug, Clone)]
pub struct PlanningOutcome {
    /// Name of the source whose plan was used.
    pub source: String,
    pub plan: Plan,
    pub report: ValidationReport,
    pub kpi: PlanKpi,
}

impl PlanningOutcome {
    /// Whether the plan may be handed on for persistence.
    pub fn is_committable(&self) -> bool {
        self.report.errors.is_empty()
    }
}

/// A configured planning run over one context.
pub struct PlanningRun<'a> {
    context: Context,
    sources: Vec<Box<dyn PlanSource + 'a>>,
}

impl<'a> PlanningRun<'a> {
    /// Creates a run with no sources; the heuristic is used unless
    /// sources are added.
    pub fn new(context: Context) -> Self {
        Self {
            context,
            sources: Vec::new(),
        }
    }

    /// Builds the context from `store` for `horizon`.
    pub fn from_store(
        store: &dyn ScheduleStore,
        horizon: Horizon,
        config: PlannerConfig,
    ) -> Result<Self> {
        let context = ContextBuilder::new(config).build(store, horizon)?;
        Ok(Self::new(context))
    }

    /// Appends a source to try.
    pub fn with_source(mut self, source: impl PlanSource + 'a) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    /// Appends an external source followed by the heuristic fallback.
    pub fn with_fallback(self, source: impl PlanSource + 'a) -> Self {
        self.with_source(source).with_source(HeuristicPlanner::new())
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Runs the sources, then validates the chosen plan.
    ///
    /// # Errors
    /// Only when every source failed; a source that errors is otherwise
    /// skipped in favour of the next one.
    pub fn execute(&self) -> Result<PlanningOutcome> {
        let default_source: [Box<dyn PlanSource + 'a>; 1] = [Box::new(HeuristicPlanner::new())];
        let sources = if self.sources.is_empty() {
            &default_source[..]
        } else {
            &self.sources[..]
        };

        let mut chosen: Option<(String, Plan)> = None;
        let mut last_error = None;
        let mut any_ok = false;
        for source in sources {
            match source.propose(&self.context) {
                Ok(plan) if !plan.is_empty() => {
                    chosen = Some((source.name().to_string(), plan));
                    break;
                }
                Ok(_) => {
                    any_ok = true;
                    info!(source = source.name(), "source proposed nothing, trying next");
                }
                Err(e) => {
                    warn!(source = source.name(), error = %e, "plan source failed");
                    last_error = Some(e);
                }
            }
        }

        let (source, plan) = match (chosen, last_error) {
            (Some(found), _) => found,
            (None, Some(e)) if !any_ok => return Err(e),
            (None, _) => (
                sources
                    .last()
                    .map(|s| s.name().to_string())
                    .unwrap_or_default(),
                Plan::new(),
            ),
        };

        let report = validate_plan(&self.context, &plan);
        let kpi = PlanKpi::calculate(&plan, &self.context);
        info!(
            %source,
            assignments = plan.assignment_count(),
            errors = report.errors.len(),
            warnings = report.warnings.len(),
            coverage = kpi.coverage_rate,
            "planning run finished"
        );
        Ok(PlanningOutcome {
            source,
            plan,
            report,
            kpi,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{
        ActorRecord, ActorSkillRecord, AvailabilityRecord, JsonFileStore, MemoryStore,
        StoreSnapshot, TaskRecord, TaskSkillRecord,
    };
    use crate::error::ScheduleError;
    use crate::models::{ExistingAssignment, PlannedAssignment, Priority, TaskStatus};
    use crate::scheduler::ExternalProposal;
    use crate::validation::FindingKind;
    use chrono::{NaiveDate, NaiveTime, Weekday};

    fn d(day: u32) -> NaiveDate {
        // March 2025: the 10th is a Monday
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    fn t(h: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, 0, 0).unwrap()
    }

    fn week() -> Horizon {
        Horizon::new(d(10), d(16)).unwrap()
    }

    fn actor(id: &str, cap: f64) -> ActorRecord {
        ActorRecord {
            id: id.into(),
            name: id.into(),
            weekly_hours_max: cap,
            accept_replacement: false,
        }
    }

    fn window(actor: &str, weekday: Weekday, from: u32, to: u32) -> AvailabilityRecord {
        AvailabilityRecord {
            actor_id: actor.into(),
            weekday,
            start: t(from),
            end: t(to),
        }
    }

    fn task(id: &str, hours: f64, deadline: Option<NaiveDate>) -> TaskRecord {
        TaskRecord {
            id: id.into(),
            title: String::new(),
            duration_hours: hours,
            deadline,
            priority: Priority::Medium,
            assigned_to: None,
            status: TaskStatus::Pending,
        }
    }

    fn run(snapshot: StoreSnapshot) -> PlanningRun<'static> {
        PlanningRun::from_store(&MemoryStore::new(snapshot), week(), PlannerConfig::default())
            .unwrap()
    }

    struct FailingSource;

    impl PlanSource for FailingSource {
        fn name(&self) -> &str {
            "failing"
        }

        fn propose(&self, _ctx: &Context) -> Result<Plan> {
            Err(ScheduleError::DataAccess("proposer unreachable".into()))
        }
    }

    #[test]
    fn test_single_block_plan_is_clean() {
        let outcome = run(StoreSnapshot {
            actors: vec![actor("E1", 35.0)],
            availability: vec![window("E1", Weekday::Mon, 9, 13)],
            tasks: vec![task("T1", 3.0, None)],
            ..Default::default()
        })
        .execute()
        .unwrap();

        assert_eq!(outcome.source, "heuristic");
        assert_eq!(
            outcome.plan.assignments,
            vec![PlannedAssignment::new("E1", "T1", d(10), t(9), t(12))]
        );
        assert!(outcome.report.is_clean());
        assert!(outcome.is_committable());
        assert!((outcome.kpi.coverage_rate - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_forced_plan_over_weekly_cap_warns() {
        let snapshot = StoreSnapshot {
            actors: vec![actor("E1", 10.0)],
            availability: vec![
                window("E1", Weekday::Mon, 8, 17),
                window("E1", Weekday::Tue, 8, 17),
            ],
            tasks: vec![task("T1", 2.0, None)],
            assignments: vec![ExistingAssignment::new("E1", "T0", d(10), t(8), t(17))],
            ..Default::default()
        };

        let heuristic = run(snapshot.clone()).execute().unwrap();
        assert!(heuristic.plan.is_empty());
        assert_eq!(heuristic.kpi.unplanned_minutes(), 120);

        let mut forced = Plan::new();
        forced.add_assignment(PlannedAssignment::new("E1", "T1", d(11), t(9), t(11)));
        let outcome = run(snapshot)
            .with_source(ExternalProposal::new("forced", forced))
            .execute()
            .unwrap();
        assert_eq!(outcome.source, "forced");
        assert!(outcome.report.errors.is_empty());
        assert_eq!(outcome.report.findings_of(FindingKind::WeeklyOverrun).len(), 1);
        assert!(outcome.is_committable());
    }

    #[test]
    fn test_forced_skill_mismatch_blocks_commit() {
        let snapshot = StoreSnapshot {
            actors: vec![actor("E1", 35.0)],
            availability: vec![window("E1", Weekday::Mon, 9, 17)],
            tasks: vec![task("T1", 2.0, None)],
            task_skills: vec![TaskSkillRecord {
                task_id: "T1".into(),
                skill_id: "X".into(),
            }],
            ..Default::default()
        };

        assert!(run(snapshot.clone()).execute().unwrap().plan.is_empty());

        let forced = r#"{"plan": [{"actor_id": "E1", "task_id": "T1", "date": "2025-03-10",
                                   "start_time": "09:00", "end_time": "11:00"}]}"#;
        let outcome = run(snapshot)
            .with_source(ExternalProposal::from_json_str("forced", forced).unwrap())
            .execute()
            .unwrap();
        assert_eq!(outcome.report.findings_of(FindingKind::MissingSkill).len(), 1);
        assert!(!outcome.is_committable());
    }

    #[test]
    fn test_partial_coverage_before_deadline_warns() {
        let outcome = run(StoreSnapshot {
            actors: vec![actor("E1", 35.0)],
            availability: vec![window("E1", Weekday::Mon, 9, 13)],
            tasks: vec![task("T1", 6.0, Some(d(10)))],
            ..Default::default()
        })
        .execute()
        .unwrap();

        assert_eq!(outcome.plan.planned_minutes_for_task("T1"), 240);
        assert!(outcome.report.errors.is_empty());
        assert_eq!(outcome.report.warnings.len(), 1);
        assert!(outcome.report.warnings[0].message.contains("2.00h"));
        assert!(outcome.is_committable());
    }

    #[test]
    fn test_empty_external_falls_back_to_heuristic() {
        let outcome = run(StoreSnapshot {
            actors: vec![actor("E1", 35.0)],
            availability: vec![window("E1", Weekday::Mon, 9, 13)],
            tasks: vec![task("T1", 1.0, None)],
            ..Default::default()
        })
        .with_fallback(ExternalProposal::new("model", Plan::new()))
        .execute()
        .unwrap();
        assert_eq!(outcome.source, "heuristic");
        assert_eq!(outcome.plan.assignment_count(), 1);
    }

    #[test]
    fn test_failing_source_falls_back() {
        let outcome = run(StoreSnapshot {
            actors: vec![actor("E1", 35.0)],
            availability: vec![window("E1", Weekday::Mon, 9, 13)],
            tasks: vec![task("T1", 1.0, None)],
            ..Default::default()
        })
        .with_fallback(FailingSource)
        .execute()
        .unwrap();
        assert_eq!(outcome.source, "heuristic");
    }

    #[test]
    fn test_all_sources_failing_is_an_error() {
        let result = run(StoreSnapshot::default())
            .with_source(FailingSource)
            .execute();
        assert!(matches!(result, Err(ScheduleError::DataAccess(_))));
    }

    #[test]
    fn test_nothing_to_plan() {
        let outcome = run(StoreSnapshot::default()).execute().unwrap();
        assert!(outcome.plan.is_empty());
        assert!(outcome.report.is_clean());
        assert!(outcome.is_committable());
    }

    #[test]
    fn test_from_json_file_store() {
        let snapshot = StoreSnapshot {
            actors: vec![actor("E1", 35.0)],
            actor_skills: vec![ActorSkillRecord {
                actor_id: "E1".into(),
                skill_id: "X".into(),
            }],
            availability: vec![window("E1", Weekday::Wed, 13, 18)],
            tasks: vec![task("T1", 2.5, Some(d(14)))],
            task_skills: vec![TaskSkillRecord {
                task_id: "T1".into(),
                skill_id: "X".into(),
            }],
            ..Default::default()
        };
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, serde_json::to_string(&snapshot).unwrap()).unwrap();

        let store = JsonFileStore::new(&path);
        let outcome = PlanningRun::from_store(&store, week(), PlannerConfig::default())
            .unwrap()
            .execute()
            .unwrap();
        assert_eq!(
            outcome.plan.assignments,
            vec![PlannedAssignment::new("E1", "T1", d(12), t(13), NaiveTime::from_hms_opt(15, 30, 0).unwrap())]
        );
        assert!(outcome.report.is_clean());
    }

    #[test]
    fn test_missing_store_propagates() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::new(dir.path().join("nope.json"));
        let result = PlanningRun::from_store(&store, week(), PlannerConfig::default());
        assert!(matches!(result, Err(ScheduleError::DataAccess(_))));
    }
}
