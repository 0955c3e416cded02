//! Error types.
//!
//! Only failures that abort a planning run live here. Constraint findings
//! on a candidate plan are not errors; see [`crate::validation`].

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("data access failed: {0}")]
    DataAccess(String),

    #[error("{entity} not found: {id}")]
    MissingEntity { entity: &'static str, id: String },

    #[error("invalid horizon: {from} is after {to}")]
    InvalidHorizon { from: String, to: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid time '{0}': expected HH:MM")]
    InvalidTime(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
