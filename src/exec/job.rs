// src/exec/job.rs

//! Job descriptor handed to a worker process.
//!
//! The descriptor is written to the worker's stdin as a single JSON document,
//! then stdin is closed. It carries the task, the files the orchestrator
//! found in the working folder, and the configuration sections the worker
//! kind needs to run standalone.

use serde::{Deserialize, Serialize};

use crate::config::model::{
    CategoryDefaults, MergeDefaults, ScreenshotDefaults, SplitDefaults, TransformDefaults,
    UploadDefaults,
};
use crate::config::task::Task;
use crate::errors::Result;
use crate::types::WorkerKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSettings {
    Transform {
        transform: TransformDefaults,
        split: SplitDefaults,
        screenshot: ScreenshotDefaults,
    },
    Merge {
        merge: MergeDefaults,
        split: SplitDefaults,
        screenshot: ScreenshotDefaults,
    },
    Upload {
        upload: UploadDefaults,
    },
}

impl JobSettings {
    pub fn for_kind(kind: WorkerKind, defaults: &CategoryDefaults) -> Self {
        match kind {
            WorkerKind::Transform => JobSettings::Transform {
                transform: defaults.transform.clone(),
                split: defaults.split.clone(),
                screenshot: defaults.screenshot.clone(),
            },
            WorkerKind::Merge => JobSettings::Merge {
                merge: defaults.merge.clone(),
                split: defaults.split.clone(),
                screenshot: defaults.screenshot.clone(),
            },
            WorkerKind::Upload => JobSettings::Upload {
                upload: defaults.upload.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDescriptor {
    pub kind: WorkerKind,
    /// Position of the task in the config's task list.
    pub task_index: usize,
    pub task: Task,
    /// Filenames in the task's working folder selected for this job.
    pub files: Vec<String>,
    pub settings: JobSettings,
}

impl JobDescriptor {
    pub fn new(
        kind: WorkerKind,
        task_index: usize,
        task: Task,
        files: Vec<String>,
        defaults: &CategoryDefaults,
    ) -> Self {
        Self {
            kind,
            task_index,
            task,
            files,
            settings: JobSettings::for_kind(kind, defaults),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }
}
