//! Planner configuration.
//!
//! Passed explicitly to the context builder, the planner and the
//! validator. Nothing is read from the environment.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{Result, ScheduleError};
use crate::interval::MINUTES_PER_DAY;

/// Planning objectives, most important first.
///
/// The greedy planner encodes this ordering structurally (tasks sorted by
/// priority then deadline); the list is carried for reviewers and for
/// external proposers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    NoDeadlineDelay,
    PriorityWeightedCoverage,
    MinimizeUnplannedHours,
}

/// Secondary ordering among equally-qualified candidate actors.
///
/// The originally-assigned actor is always tried first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateOrder {
    /// Actors in the order the store supplied them.
    #[default]
    LoadOrder,
    /// Actors with the fewest minutes committed in the horizon first,
    /// ties in load order.
    FewestCommittedHours,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    #[serde(default = "default_granularity")]
    pub granularity_minutes: u32,
    #[serde(default = "default_max_continuous")]
    pub max_continuous_hours: f64,
    #[serde(default = "default_working_days")]
    pub working_days: Vec<Weekday>,
    #[serde(default = "default_objective")]
    pub objective: Vec<Objective>,
    #[serde(default)]
    pub candidate_order: CandidateOrder,
}

fn default_granularity() -> u32 {
    30
}

fn default_max_continuous() -> f64 {
    6.0
}

fn default_working_days() -> Vec<Weekday> {
    vec![
        Weekday::Mon,
        Weekday::Tue,
        Weekday::Wed,
        Weekday::Thu,
        Weekday::Fri,
        Weekday::Sat,
        Weekday::Sun,
    ]
}

fn default_objective() -> Vec<Objective> {
    vec![
        Objective::NoDeadlineDelay,
        Objective::PriorityWeightedCoverage,
        Objective::MinimizeUnplannedHours,
    ]
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            granularity_minutes: default_granularity(),
            max_continuous_hours: default_max_continuous(),
            working_days: default_working_days(),
            objective: default_objective(),
            candidate_order: CandidateOrder::default(),
        }
    }
}

impl PlannerConfig {
    pub fn with_granularity(mut self, minutes: u32) -> Self {
        self.granularity_minutes = minutes;
        self
    }

    pub fn with_max_continuous_hours(mut self, hours: f64) -> Self {
        self.max_continuous_hours = hours;
        self
    }

    pub fn with_working_days(mut self, days: Vec<Weekday>) -> Self {
        self.working_days = days;
        self
    }

    pub fn with_candidate_order(mut self, order: CandidateOrder) -> Self {
        self.candidate_order = order;
        self
    }

    /// Continuity cap in whole minutes.
    pub fn max_continuous_minutes(&self) -> u32 {
        (self.max_continuous_hours * 60.0).round().max(0.0) as u32
    }

    pub fn is_working_day(&self, weekday: Weekday) -> bool {
        self.working_days.contains(&weekday)
    }

    /// Rejects settings the planner cannot honour.
    pub fn validate(&self) -> Result<()> {
        let g = self.granularity_minutes;
        if g == 0 || g > MINUTES_PER_DAY || MINUTES_PER_DAY % g != 0 {
            return Err(ScheduleError::InvalidConfig(format!(
                "granularity_minutes must divide a day evenly, got {g}"
            )));
        }
        if !self.max_continuous_hours.is_finite() || self.max_continuous_minutes() < g {
            return Err(ScheduleError::InvalidConfig(format!(
                "max_continuous_hours ({}) is shorter than one {g}-minute slot",
                self.max_continuous_hours
            )));
        }
        Ok(())
    }

    /// Parses and validates a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }
}
