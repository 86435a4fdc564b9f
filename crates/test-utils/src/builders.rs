#![allow(dead_code)]

use std::path::PathBuf;

use lanekeeper::config::{
    CategoryDefaults, ConfigFile, ConfigSection, ExecutableTime, MemoryConfigSource,
    MergeTask, RawConfigFile, RelocateTask, RetrySection, Task, TaskCommon, TransformTask,
    UploadTask, WorkerConfig, WorkersSection,
};
use lanekeeper::types::{TaskCategory, WorkerKind};

/// Builder for `RawConfigFile` / `ConfigFile` to simplify test setup.
///
/// Retries default to a single quick retry so failure paths stay fast.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                retry: RetrySection {
                    max_retries: 1,
                    delay_ms: 1,
                },
                worker: WorkersSection::default(),
                defaults: CategoryDefaults::default(),
                task: Vec::new(),
            },
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.config.task.push(task);
        self
    }

    pub fn with_worker(self, kind: WorkerKind, cmd: &str) -> Self {
        self.set_worker(kind, cmd, false)
    }

    /// Worker whose failures persist `skip = true` on the task.
    pub fn with_disabling_worker(self, kind: WorkerKind, cmd: &str) -> Self {
        self.set_worker(kind, cmd, true)
    }

    /// Register the same placeholder command for every worker kind.
    pub fn with_all_workers(self) -> Self {
        self.with_worker(WorkerKind::Transform, "transform-worker")
            .with_worker(WorkerKind::Merge, "merge-worker")
            .with_worker(WorkerKind::Upload, "upload-worker")
    }

    pub fn paused(mut self, pause: bool) -> Self {
        self.config.config.pause = pause;
        self
    }

    pub fn check_interval(mut self, secs: u64) -> Self {
        self.config.config.check_interval = secs;
        self
    }

    pub fn retry(mut self, max_retries: u32, delay_ms: u64) -> Self {
        self.config.retry = RetrySection {
            max_retries,
            delay_ms,
        };
        self
    }

    pub fn upload_window(mut self, window: ExecutableTime) -> Self {
        self.config.defaults.upload.executable_time = Some(window);
        self
    }

    fn set_worker(mut self, kind: WorkerKind, cmd: &str, disable_on_failure: bool) -> Self {
        let worker = Some(WorkerConfig {
            cmd: cmd.to_string(),
            disable_on_failure,
        });
        match kind {
            WorkerKind::Transform => self.config.worker.transform = worker,
            WorkerKind::Merge => self.config.worker.merge = worker,
            WorkerKind::Upload => self.config.worker.upload = worker,
        }
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }

    pub fn source(self) -> MemoryConfigSource {
        MemoryConfigSource::new(self.config)
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `Task`.
///
/// `folder` is the working folder for worker tasks and the target folder for
/// relocation tasks. The output folder defaults to `<folder>/out`.
pub struct TaskBuilder {
    category: TaskCategory,
    common: TaskCommon,
    folder: PathBuf,
    output: Option<PathBuf>,
}

impl TaskBuilder {
    pub fn new(category: TaskCategory, folder: &str) -> Self {
        Self {
            category,
            common: TaskCommon::default(),
            folder: PathBuf::from(folder),
            output: None,
        }
    }

    pub fn transform(working: &str) -> Self {
        Self::new(TaskCategory::Transform, working)
    }

    pub fn merge(working: &str) -> Self {
        Self::new(TaskCategory::Merge, working)
    }

    pub fn upload(working: &str) -> Self {
        Self::new(TaskCategory::Upload, working)
    }

    pub fn relocate(target: &str) -> Self {
        Self::new(TaskCategory::Relocate, target)
    }

    pub fn source(mut self, dir: &str) -> Self {
        self.common.source_folders.push(PathBuf::from(dir));
        self
    }

    pub fn ext(mut self, ext: &str) -> Self {
        self.common.include_ext.push(ext.to_string());
        self
    }

    pub fn include(mut self, needle: &str) -> Self {
        self.common.includes.push(needle.to_string());
        self
    }

    pub fn exclude(mut self, needle: &str) -> Self {
        self.common.exceptions.push(needle.to_string());
        self
    }

    pub fn skip(mut self) -> Self {
        self.common.skip = true;
        self
    }

    pub fn output(mut self, dir: &str) -> Self {
        self.output = Some(PathBuf::from(dir));
        self
    }

    pub fn build(self) -> Task {
        let working_folder = self.folder;
        let output_folder = self
            .output
            .unwrap_or_else(|| working_folder.join("out"));
        let common = self.common;

        match self.category {
            TaskCategory::Transform => Task::Transform(TransformTask {
                common,
                working_folder,
                output_folder,
                screenshot: false,
                ffmpeg_setting: None,
                suffix: None,
                split: false,
                keep_files: false,
            }),
            TaskCategory::Merge => Task::Merge(MergeTask {
                common,
                working_folder,
                output_folder,
                screenshot: false,
                split: false,
                keep_files: false,
            }),
            TaskCategory::Upload => Task::Upload(UploadTask {
                common,
                working_folder,
                output_folder,
                keep_files: false,
            }),
            TaskCategory::Relocate => Task::Relocate(RelocateTask {
                common,
                target_folder: working_folder,
            }),
        }
    }
}
