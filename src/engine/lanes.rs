// src/engine/lanes.rs

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::Lane;

/// Busy flags, one per lane.
///
/// Owned by a single scheduler instance. A lane is claimed with an atomic
/// compare-and-set, so two concurrent evaluations can never both see the
/// lane idle and start a batch.
#[derive(Debug, Default)]
pub struct SchedulerState {
    busy: [AtomicBool; 3],
}

impl SchedulerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self, lane: Lane) -> bool {
        self.busy[lane.index()].load(Ordering::Acquire)
    }

    /// Mark `lane` busy if it is idle.
    ///
    /// Returns `None` when the lane is already busy. The returned guard
    /// clears the flag when dropped, whether the batch succeeded, failed or
    /// was aborted.
    pub fn try_acquire(self: &Arc<Self>, lane: Lane) -> Option<LaneGuard> {
        self.busy[lane.index()]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LaneGuard {
                state: Arc::clone(self),
                lane,
            })
    }

    pub fn busy_lanes(&self) -> Vec<Lane> {
        Lane::ALL.into_iter().filter(|l| self.is_busy(*l)).collect()
    }
}

#[derive(Debug)]
pub struct LaneGuard {
    state: Arc<SchedulerState>,
    lane: Lane,
}

impl LaneGuard {
    pub fn lane(&self) -> Lane {
        self.lane
    }
}

impl Drop for LaneGuard {
    fn drop(&mut self) {
        self.state.busy[self.lane.index()].store(false, Ordering::Release);
    }
}
