//! Shift scheduling domain models.
//!
//! Provides the data types for describing who can work when, what work is
//! pending, and what a proposed plan looks like.
//!
//! # Domain Mappings
//!
//! | shift-planner | Staffing | Field service | Healthcare |
//! |---------------|----------|---------------|------------|
//! | Actor | Employee | Technician | Nurse |
//! | Task | Work order | Site visit | Care task |
//! | AvailabilityWindow | Contract hours | Shift pattern | Rota |
//! | Plan | Roster proposal | Dispatch plan | Shift plan |

mod actor;
mod calendar;
mod plan;
mod task;
pub mod wire;

pub use actor::Actor;
pub use calendar::{Absence, AvailabilityWindow, Horizon, WeekKey};
pub use plan::{ExistingAssignment, Plan, PlannedAssignment};
pub use task::{Priority, Task, TaskStatus};
