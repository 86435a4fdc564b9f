// src/config/task.rs

//! Task model: one `[[task]]` entry in the config.
//!
//! ```toml
//! [[task]]
//! type = "transform"
//! source_folders = ["/srv/incoming"]
//! include_ext = ["mp4"]
//! exceptions = ["_tmp"]
//! working_folder = "/srv/work"
//! output_folder = "/srv/done"
//! split = true
//! ```
//!
//! Tasks have no persisted identity. They are read fresh on every tick and
//! identified structurally: two entries with equal fields are the same task.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::files::TargetFilter;
use crate::types::TaskCategory;

/// Fields shared by every task category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TaskCommon {
    /// Folders to pull matching files from.
    #[serde(default)]
    pub source_folders: Vec<PathBuf>,

    /// Extension allow-list (without the dot, case-sensitive).
    #[serde(default)]
    pub include_ext: Vec<String>,

    /// If non-empty, a filename must contain at least one of these.
    #[serde(default)]
    pub includes: Vec<String>,

    /// A filename containing any of these is never selected.
    #[serde(default)]
    pub exceptions: Vec<String>,

    #[serde(default)]
    pub skip: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformTask {
    #[serde(flatten)]
    pub common: TaskCommon,
    pub working_folder: PathBuf,
    pub output_folder: PathBuf,
    #[serde(default)]
    pub screenshot: bool,
    /// Overrides `transform.default_ffmpeg_setting` (or names a
    /// `transform.custom_setting` entry).
    #[serde(default)]
    pub ffmpeg_setting: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
    #[serde(default)]
    pub split: bool,
    #[serde(default)]
    pub keep_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeTask {
    #[serde(flatten)]
    pub common: TaskCommon,
    pub working_folder: PathBuf,
    pub output_folder: PathBuf,
    #[serde(default)]
    pub screenshot: bool,
    #[serde(default)]
    pub split: bool,
    #[serde(default)]
    pub keep_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTask {
    #[serde(flatten)]
    pub common: TaskCommon,
    pub working_folder: PathBuf,
    pub output_folder: PathBuf,
    #[serde(default)]
    pub keep_files: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelocateTask {
    #[serde(flatten)]
    pub common: TaskCommon,
    pub target_folder: PathBuf,
}

/// A schedulable unit of work, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Task {
    Transform(TransformTask),
    Merge(MergeTask),
    Upload(UploadTask),
    Relocate(RelocateTask),
}

impl Task {
    pub fn category(&self) -> TaskCategory {
        match self {
            Task::Transform(_) => TaskCategory::Transform,
            Task::Merge(_) => TaskCategory::Merge,
            Task::Upload(_) => TaskCategory::Upload,
            Task::Relocate(_) => TaskCategory::Relocate,
        }
    }

    pub fn common(&self) -> &TaskCommon {
        match self {
            Task::Transform(t) => &t.common,
            Task::Merge(t) => &t.common,
            Task::Upload(t) => &t.common,
            Task::Relocate(t) => &t.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut TaskCommon {
        match self {
            Task::Transform(t) => &mut t.common,
            Task::Merge(t) => &mut t.common,
            Task::Upload(t) => &mut t.common,
            Task::Relocate(t) => &mut t.common,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.common().skip
    }

    /// Where files pulled from `source_folders` end up.
    pub fn destination(&self) -> &Path {
        match self {
            Task::Transform(t) => &t.working_folder,
            Task::Merge(t) => &t.working_folder,
            Task::Upload(t) => &t.working_folder,
            Task::Relocate(t) => &t.target_folder,
        }
    }

    pub fn filter(&self) -> TargetFilter {
        let common = self.common();
        TargetFilter {
            include_ext: common.include_ext.clone(),
            includes: common.includes.clone(),
            excludes: common.exceptions.clone(),
        }
    }
}
