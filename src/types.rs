use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of work a task describes.
///
/// Every `[[task]]` entry in the config carries one of these as its
/// `type = "..."` tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Transform,
    Merge,
    Upload,
    Relocate,
}

impl TaskCategory {
    pub const ALL: [TaskCategory; 4] = [
        TaskCategory::Transform,
        TaskCategory::Merge,
        TaskCategory::Upload,
        TaskCategory::Relocate,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Transform => "transform",
            TaskCategory::Merge => "merge",
            TaskCategory::Upload => "upload",
            TaskCategory::Relocate => "relocate",
        }
    }

    /// Worker process kind for this category, or `None` when the work is done
    /// in-process (relocation).
    pub fn worker_kind(&self) -> Option<WorkerKind> {
        match self {
            TaskCategory::Transform => Some(WorkerKind::Transform),
            TaskCategory::Merge => Some(WorkerKind::Merge),
            TaskCategory::Upload => Some(WorkerKind::Upload),
            TaskCategory::Relocate => None,
        }
    }
}

impl fmt::Display for TaskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskCategory {
    type Err = crate::errors::LanekeeperError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "transform" => Ok(TaskCategory::Transform),
            "merge" => Ok(TaskCategory::Merge),
            "upload" => Ok(TaskCategory::Upload),
            "relocate" => Ok(TaskCategory::Relocate),
            other => Err(crate::errors::LanekeeperError::UnknownCategory(
                other.to_string(),
            )),
        }
    }
}

/// Concurrency lane. At most one batch per lane is in flight at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Lane {
    /// Transform and merge tasks share a lane; merges consume transform output.
    Media,
    Upload,
    Relocate,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Media, Lane::Upload, Lane::Relocate];

    pub(crate) fn index(&self) -> usize {
        match self {
            Lane::Media => 0,
            Lane::Upload => 1,
            Lane::Relocate => 2,
        }
    }
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Media => f.write_str("transform+merge"),
            Lane::Upload => f.write_str("upload"),
            Lane::Relocate => f.write_str("relocate"),
        }
    }
}

/// Kind of out-of-process worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerKind {
    Transform,
    Merge,
    Upload,
}

impl WorkerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::Transform => "transform",
            WorkerKind::Merge => "merge",
            WorkerKind::Upload => "upload",
        }
    }

    pub fn category(&self) -> TaskCategory {
        match self {
            WorkerKind::Transform => TaskCategory::Transform,
            WorkerKind::Merge => TaskCategory::Merge,
            WorkerKind::Upload => TaskCategory::Upload,
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
