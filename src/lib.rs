//! Constraint-based shift planning.
//!
//! Assigns actors (employees) to tasks over a closed date horizon, subject
//! to skills, weekly availability windows, approved absences, weekly-hour
//! caps and a continuity limit, and re-validates any candidate plan
//! before it may be committed.
//!
//! # Modules
//!
//! - **`interval`**: Half-open minute intervals: overlap, merge, subtract, quantize
//! - **`models`**: Domain types: `Actor`, `Task`, `Plan`, `Horizon`, `WeekKey`
//! - **`context`**: Store contract and the `Context` of allowed slots
//! - **`scheduler`**: Greedy planner, `PlanSource` implementations, KPIs
//! - **`validation`**: Independent plan checks producing errors and warnings
//! - **`pipeline`**: One run from store to validated plan, with source fallback
//!
//! # Architecture
//!
//! ```text
//! ScheduleStore -> ContextBuilder -> Context
//!                                     |
//!                  {GreedyPlanner | ExternalProposal} -> Plan
//!                                     |
//!                              validate_plan -> ValidationReport
//! ```
//!
//! Planning and validation are pure and single-threaded. Independent runs
//! share nothing and may execute in parallel.

pub mod config;
pub mod context;
pub mod error;
pub mod interval;
pub mod models;
pub mod occupancy;
pub mod pipeline;
pub mod scheduler;
pub mod validation;

pub use config::{CandidateOrder, PlannerConfig};
pub use context::{Context, ContextBuilder, ScheduleStore};
pub use error::{Result, ScheduleError};
pub use pipeline::{PlanningOutcome, PlanningRun};
pub use validation::{validate_plan, ValidationReport};
