// src/exec/dispatcher.rs

//! Per-task dispatch.
//!
//! For a worker task the steps are:
//! 1. honour `skip` (and the upload time window),
//! 2. pull matching files from `source_folders` into the working folder,
//! 3. re-list the working folder; stop if nothing matches,
//! 4. hand a [`JobDescriptor`] to the [`WorkerBackend`] and await the outcome.
//!
//! Relocation tasks stop after step 2, with `target_folder` as destination.
//! Every failure is recorded in the error log with the task category and
//! returned to the caller as an `Err`; nothing escapes as a panic.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::config::model::ConfigFile;
use crate::config::source::ConfigSource;
use crate::config::task::Task;
use crate::error_log::ErrorLog;
use crate::errors::{LanekeeperError, Result};
use crate::exec::backend::{WorkerBackend, WorkerOutcome};
use crate::exec::job::JobDescriptor;
use crate::files::{MoveReport, Relocator, enumerate_targets};
use crate::fs::FileSystem;
use crate::types::WorkerKind;

/// Source of "now" for the upload window check.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// How a dispatch ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// `skip = true` in config.
    Skipped,
    /// Upload requested outside `upload.executable_time`.
    OutsideWindow,
    /// No matching files in the working folder.
    NothingToDo,
    /// A worker ran and exited successfully.
    Completed { files: usize },
    /// A relocation task ran.
    Relocated(MoveReport),
}

pub struct Dispatcher {
    fs: Arc<dyn FileSystem>,
    backend: Arc<dyn WorkerBackend>,
    source: Arc<dyn ConfigSource>,
    errors: ErrorLog,
    clock: Clock,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("fs", &self.fs)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        backend: Arc<dyn WorkerBackend>,
        source: Arc<dyn ConfigSource>,
        errors: ErrorLog,
    ) -> Self {
        Self {
            fs,
            backend,
            source,
            errors,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn errors(&self) -> &ErrorLog {
        &self.errors
    }

    /// Dispatch `task` according to its category.
    pub async fn dispatch(
        &self,
        cfg: &ConfigFile,
        index: usize,
        task: &Task,
    ) -> Result<DispatchOutcome> {
        match task.category().worker_kind() {
            Some(kind) => self.dispatch_worker(cfg, index, task, kind).await,
            None => self.dispatch_relocation(cfg, index, task).await,
        }
    }

    /// Run `task` on a worker of `kind`.
    pub async fn dispatch_worker(
        &self,
        cfg: &ConfigFile,
        index: usize,
        task: &Task,
        kind: WorkerKind,
    ) -> Result<DispatchOutcome> {
        let category = task.category();
        if kind.category() != category {
            return Err(LanekeeperError::ConfigError(format!(
                "task #{index} is a {category} task and can not run on a {kind} worker"
            )));
        }

        let result = self.run_worker_task(cfg, index, task, kind).await;

        if let Err(err) = &result {
            self.errors
                .record(&format!("dispatch:{category}"), format!("task #{index}: {err}"));

            let worker_failed = matches!(
                err,
                LanekeeperError::WorkerFailed { .. } | LanekeeperError::WorkerSpawn { .. }
            );
            let disable = cfg.worker.get(kind).is_some_and(|w| w.disable_on_failure);
            if worker_failed && disable {
                self.disable_task(index, task);
            }
        }

        result
    }

    /// Pull matching files from `source_folders` into `target_folder`.
    pub async fn dispatch_relocation(
        &self,
        cfg: &ConfigFile,
        index: usize,
        task: &Task,
    ) -> Result<DispatchOutcome> {
        let category = task.category();
        if task.is_skipped() {
            warn!(category = %category, task_index = index, "task skipped due to config");
            return Ok(DispatchOutcome::Skipped);
        }

        let result: Result<DispatchOutcome> = async {
            self.fs.create_dir_all(task.destination())?;
            let report = self.pull_sources(cfg, index, task).await?;
            Ok(DispatchOutcome::Relocated(report))
        }
        .await;

        if let Err(err) = &result {
            self.errors
                .record(&format!("dispatch:{category}"), format!("task #{index}: {err}"));
        }
        result
    }

    async fn run_worker_task(
        &self,
        cfg: &ConfigFile,
        index: usize,
        task: &Task,
        kind: WorkerKind,
    ) -> Result<DispatchOutcome> {
        let category = task.category();

        if task.is_skipped() {
            warn!(category = %category, task_index = index, "task skipped due to config");
            return Ok(DispatchOutcome::Skipped);
        }

        if kind == WorkerKind::Upload {
            if let Some(window) = cfg.defaults.upload.executable_time {
                let now = (self.clock)();
                if !window.contains(now) {
                    info!(task_index = index, %now, "outside upload window; not uploading");
                    return Ok(DispatchOutcome::OutsideWindow);
                }
            }
        }

        let worker = cfg.worker.get(kind).ok_or_else(|| {
            LanekeeperError::ConfigError(format!("no [worker.{kind}] command configured"))
        })?;

        let working = task.destination().to_path_buf();
        self.fs.create_dir_all(&working)?;
        self.pull_sources(cfg, index, task).await?;

        let files = self.ready_files(task, &working)?;
        if files.is_empty() {
            info!(
                category = %category,
                task_index = index,
                folder = ?working,
                "no files at working folder; nothing to do"
            );
            return Ok(DispatchOutcome::NothingToDo);
        }

        info!(
            category = %category,
            task_index = index,
            folder = ?working,
            files = files.len(),
            "starting {kind} job"
        );

        let count = files.len();
        let job = JobDescriptor::new(kind, index, task.clone(), files, &cfg.defaults);
        match self.backend.run_job(&worker.cmd, job).await? {
            WorkerOutcome::Success => {
                info!(category = %category, task_index = index, "{kind} job done");
                Ok(DispatchOutcome::Completed { files: count })
            }
            WorkerOutcome::Failed(code) => Err(LanekeeperError::WorkerFailed { category, code }),
        }
    }

    /// Move every matching file in the task's source folders into its
    /// destination. Missing source folders only warn.
    async fn pull_sources(&self, cfg: &ConfigFile, index: usize, task: &Task) -> Result<MoveReport> {
        let category = task.category();
        let common = task.common();

        let sources: Vec<PathBuf> = common
            .source_folders
            .iter()
            .filter(|dir| {
                let present = self.fs.is_dir(dir);
                if !present {
                    warn!(category = %category, task_index = index, folder = ?dir, "source folder not found");
                }
                present
            })
            .cloned()
            .collect();

        if sources.is_empty() {
            info!(category = %category, task_index = index, "no source folders to pull from");
            return Ok(MoveReport::default());
        }

        let targets = enumerate_targets(self.fs.as_ref(), &sources, &task.filter())?;
        if targets.is_empty() {
            info!(category = %category, task_index = index, "no target files in source folders");
            return Ok(MoveReport::default());
        }

        let relocator = Relocator::new(self.fs.clone(), cfg.retry.policy(), self.errors.clone());
        Ok(relocator.move_targets(&targets, task.destination()).await)
    }

    fn ready_files(&self, task: &Task, working: &PathBuf) -> Result<Vec<String>> {
        let found = enumerate_targets(
            self.fs.as_ref(),
            std::slice::from_ref(working),
            &task.filter(),
        )?;
        Ok(found.into_values().next().unwrap_or_default())
    }

    fn disable_task(&self, index: usize, task: &Task) {
        let category = task.category();
        match self.source.disable_task(index, task) {
            Ok(true) => warn!(
                category = %category,
                task_index = index,
                "task disabled after worker failure"
            ),
            Ok(false) => warn!(
                category = %category,
                task_index = index,
                "failed task was edited or removed meanwhile; left as is"
            ),
            Err(err) => self
                .errors
                .record("disable_task", format!("task #{index} ({category}): {err}")),
        }
    }
}
