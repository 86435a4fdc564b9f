// src/engine/mod.rs

//! Polling engine.
//!
//! - [`priority`] maps task categories onto lanes and fixes their order.
//! - [`lanes`] holds the per-lane busy flags.
//! - [`scheduler`] runs the tick loop and starts one batch per idle lane.

use std::time::Duration;

pub mod lanes;
pub mod priority;
pub mod scheduler;

pub use lanes::{LaneGuard, SchedulerState};
pub use priority::{
    IndexedTask, LANE_PRIORITY, PriorityEntry, lane_of, partition, rank_of,
    validate_priority_table,
};
pub use scheduler::Scheduler;

use crate::types::Lane;

/// What a tick did with one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaneDecision {
    /// A batch of `tasks` was started.
    Started { tasks: usize },
    /// The lane had work but a previous batch is still running.
    Busy,
    /// No task in the config belongs to this lane.
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    /// True when the tick was skipped because of `config.pause`. No lane is
    /// evaluated on a paused tick, so `lanes` is empty.
    pub paused: bool,
    pub lanes: Vec<(Lane, LaneDecision)>,
    pub next_tick_in: Duration,
}

impl TickReport {
    pub fn decision(&self, lane: Lane) -> Option<LaneDecision> {
        self.lanes
            .iter()
            .find(|(l, _)| *l == lane)
            .map(|(_, d)| *d)
    }
}
