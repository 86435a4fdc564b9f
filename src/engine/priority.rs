// src/engine/priority.rs

//! Lane membership and dispatch order.
//!
//! Transform runs before merge inside the shared lane because merges
//! consume transform output. The order is fixed; config can not change it.

use std::collections::BTreeMap;

use crate::config::task::Task;
use crate::errors::{LanekeeperError, Result};
use crate::types::{Lane, TaskCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriorityEntry {
    pub category: TaskCategory,
    pub lane: Lane,
    /// Lower runs first within the lane.
    pub rank: u8,
}

pub const LANE_PRIORITY: [PriorityEntry; 4] = [
    PriorityEntry {
        category: TaskCategory::Transform,
        lane: Lane::Media,
        rank: 1,
    },
    PriorityEntry {
        category: TaskCategory::Merge,
        lane: Lane::Media,
        rank: 2,
    },
    PriorityEntry {
        category: TaskCategory::Upload,
        lane: Lane::Upload,
        rank: 1,
    },
    PriorityEntry {
        category: TaskCategory::Relocate,
        lane: Lane::Relocate,
        rank: 1,
    },
];

fn entry(category: TaskCategory) -> Option<&'static PriorityEntry> {
    LANE_PRIORITY.iter().find(|e| e.category == category)
}

pub fn lane_of(category: TaskCategory) -> Result<Lane> {
    entry(category)
        .map(|e| e.lane)
        .ok_or_else(|| LanekeeperError::UnknownCategory(category.to_string()))
}

pub fn rank_of(category: TaskCategory) -> Result<u8> {
    entry(category)
        .map(|e| e.rank)
        .ok_or_else(|| LanekeeperError::UnknownCategory(category.to_string()))
}

/// Check that `table` lists every category exactly once and that every lane
/// has at least one category.
pub fn validate_priority_table(table: &[PriorityEntry]) -> Result<()> {
    for category in TaskCategory::ALL {
        let count = table.iter().filter(|e| e.category == category).count();
        match count {
            1 => {}
            0 => {
                return Err(LanekeeperError::ConfigError(format!(
                    "priority table has no entry for category '{category}'"
                )));
            }
            n => {
                return Err(LanekeeperError::ConfigError(format!(
                    "priority table lists category '{category}' {n} times"
                )));
            }
        }
    }

    for lane in Lane::ALL {
        if !table.iter().any(|e| e.lane == lane) {
            return Err(LanekeeperError::ConfigError(format!(
                "priority table has no category for lane '{lane}'"
            )));
        }
    }

    Ok(())
}

/// A task together with its position in the config's task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedTask {
    pub index: usize,
    pub task: Task,
}

/// Split `tasks` into per-lane batches in dispatch order.
///
/// Within a lane, tasks are ordered by category rank; tasks of the same
/// category keep their config order. Lanes with no tasks are absent.
pub fn partition(tasks: &[Task]) -> Result<BTreeMap<Lane, Vec<IndexedTask>>> {
    let mut keyed: Vec<(Lane, u8, IndexedTask)> = Vec::with_capacity(tasks.len());
    for (index, task) in tasks.iter().enumerate() {
        let category = task.category();
        keyed.push((
            lane_of(category)?,
            rank_of(category)?,
            IndexedTask {
                index,
                task: task.clone(),
            },
        ));
    }

    // Stable sort keeps config order among equal ranks.
    keyed.sort_by_key(|(_, rank, t)| (*rank, t.index));

    let mut lanes: BTreeMap<Lane, Vec<IndexedTask>> = BTreeMap::new();
    for (lane, _, task) in keyed {
        lanes.entry(lane).or_default().push(task);
    }
    Ok(lanes)
}
