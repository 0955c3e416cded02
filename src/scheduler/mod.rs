//! Plan sources and KPI evaluation.
//!
//! Provides the greedy heuristic planner, the [`PlanSource`] seam that
//! lets externally-produced proposals stand in for it, and plan quality
//! metrics.
//!
//! # Algorithm
//!
//! `GreedyPlanner` walks tasks by priority then deadline and packs each
//! into contiguous free slots of qualified actors. It is not optimal, but
//! it is fast and fully deterministic.
//!
//! # KPI
//!
//! `PlanKpi` computes coverage, deadline adherence, per-actor load and
//! replacement counts.

mod greedy;
mod kpi;
mod source;

pub use greedy::{GreedyOutcome, GreedyPlanner};
pub use kpi::PlanKpi;
pub use source::{ExternalProposal, HeuristicPlanner, PlanSource};
