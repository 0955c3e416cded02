//! Interchangeable plan sources.
//!
//! Anything that can turn a [`Context`] into a candidate [`Plan`] is a
//! [`PlanSource`]: the built-in greedy heuristic, or a proposal produced
//! elsewhere and supplied as JSON. Every plan is validated the same way
//! regardless of where it came from.

use std::path::Path;
use tracing::debug;

use super::greedy::GreedyPlanner;
use crate::context::Context;
use crate::error::Result;
use crate::models::Plan;

/// A producer of candidate plans.
pub trait PlanSource {
    /// Short identifier used in logs and outcomes.
    fn name(&self) -> &str;

    /// Proposes a plan for `ctx`. An empty plan means "nothing to offer".
    fn propose(&self, ctx: &Context) -> Result<Plan>;
}

/// The built-in greedy heuristic as a plan source.
#[derive(Debug, Clone, Default)]
pub struct HeuristicPlanner {
    planner: GreedyPlanner,
}

impl HeuristicPlanner {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlanSource for HeuristicPlanner {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn propose(&self, ctx: &Context) -> Result<Plan> {
        let outcome = self.planner.plan(ctx);
        for (task, minutes) in outcome.unplanned() {
            debug!(task, minutes, "left unplanned by heuristic");
        }
        Ok(outcome.plan)
    }
}

/// A plan produced outside this crate.
#[derive(Debug, Clone)]
pub struct ExternalProposal {
    name: String,
    plan: Plan,
}

impl ExternalProposal {
    pub fn new(name: impl Into<String>, plan: Plan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }

    /// Parses a proposal document (`{"plan": [...], "notes": ...}`).
    pub fn from_json_str(name: impl Into<String>, json: &str) -> Result<Self> {
        Ok(Self::new(name, Plan::from_json_str(json)?))
    }

    /// Reads a proposal document from disk.
    pub fn from_json_file(name: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(name, &content)
    }

    pub fn plan(&self) -> &Plan {
        &self.plan
    }
}

impl PlanSource for ExternalProposal {
    fn name(&self) -> &str {
        &self.name
    }

    fn propose(&self, _ctx: &Context) -> Result<Plan> {
        debug!(source = %self.name, entries = self.plan.assignment_count(), "external proposal");
        Ok(self.plan.clone())
    }
}
