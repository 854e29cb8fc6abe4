//! Health check cycle.
//!
//! The runner is the only place where the client, the state store and the
//! pure health logic meet. Cycle scheduling is left to the caller.

mod runner;
mod types;

pub use runner::CycleRunner;
pub use types::{
    CycleError, CycleReport, CycleSettings, CycleSummary, FailureStage, TorrentFailure,
};
