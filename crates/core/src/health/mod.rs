//! Health classification, check scheduling and action planning.
//!
//! Everything here is pure: no I/O, no clock reads.

mod classify;
mod plan;
mod schedule;
mod types;

pub use classify::classify;
pub use plan::plan;
pub use schedule::{interval_from_days, is_due, select_due};
pub use types::{Action, ActionPolicy, Classification, Thresholds};
