// src/config/source.rs

//! Durable configuration store.
//!
//! The scheduler never caches configuration across ticks: it calls
//! [`ConfigSource::load`] at the top of every tick and works from the
//! returned snapshot. The only write path is [`ConfigSource::disable_task`],
//! used by the dispatcher's failure handling.

use std::fmt::Debug;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::loader::{load_and_validate, parse_str};
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::task::Task;
use crate::errors::{LanekeeperError, Result};

pub trait ConfigSource: Send + Sync + Debug {
    /// Read and validate a fresh snapshot.
    fn load(&self) -> Result<ConfigFile>;

    /// Persist `skip = true` on `task`, which sat at `index` when its
    /// snapshot was taken.
    ///
    /// Returns `Ok(false)` when the current task list no longer holds an
    /// entry equal to `task`; nothing is written in that case.
    fn disable_task(&self, index: usize, task: &Task) -> Result<bool>;
}

/// Find `task` in `tasks`, preferring the entry at `index`.
fn locate(tasks: &[Task], index: usize, task: &Task) -> Option<usize> {
    if tasks.get(index) == Some(task) {
        return Some(index);
    }
    tasks.iter().position(|t| t == task)
}

/// TOML file on disk.
///
/// Writes go to a sibling temp file that is renamed over the config, so a
/// concurrent [`ConfigSource::load`] sees either the old or the new file.
/// Clones share one write lock.
#[derive(Debug, Clone)]
pub struct FileConfigSource {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn replace_contents(&self, contents: &str) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("creating temp file next to {:?}", self.path))?;
        if let Ok(meta) = fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| e.error)
            .with_context(|| format!("replacing config {:?}", self.path))?;
        Ok(())
    }
}

impl ConfigSource for FileConfigSource {
    fn load(&self) -> Result<ConfigFile> {
        load_and_validate(&self.path)
    }

    fn disable_task(&self, index: usize, task: &Task) -> Result<bool> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("reading config {:?}", self.path))?;
        let current = parse_str(&contents)?;
        let Some(position) = locate(&current.task, index, task) else {
            warn!(path = ?self.path, task_index = index, "task no longer in config; not disabling");
            return Ok(false);
        };

        let mut doc: toml::Table = toml::from_str(&contents)?;
        let entry = doc
            .get_mut("task")
            .and_then(|v| v.as_array_mut())
            .and_then(|tasks| tasks.get_mut(position))
            .and_then(|t| t.as_table_mut())
            .ok_or_else(|| {
                LanekeeperError::ConfigError(format!("no [[task]] entry at index {position}"))
            })?;
        entry.insert("skip".to_string(), toml::Value::Boolean(true));

        self.replace_contents(&toml::to_string(&doc)?)?;

        info!(path = ?self.path, task_index = position, "persisted skip = true for task");
        Ok(true)
    }
}

/// In-memory store, shared between clones.
///
/// Useful for embedding and tests: callers can flip `pause` or edit the task
/// list between ticks through [`MemoryConfigSource::update`].
#[derive(Debug, Clone)]
pub struct MemoryConfigSource {
    raw: Arc<Mutex<RawConfigFile>>,
}

impl MemoryConfigSource {
    pub fn new(raw: RawConfigFile) -> Self {
        Self {
            raw: Arc::new(Mutex::new(raw)),
        }
    }

    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut RawConfigFile),
    {
        let mut guard = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    pub fn snapshot(&self) -> RawConfigFile {
        self.raw
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ConfigSource for MemoryConfigSource {
    fn load(&self) -> Result<ConfigFile> {
        ConfigFile::try_from(self.snapshot())
    }

    fn disable_task(&self, index: usize, task: &Task) -> Result<bool> {
        let mut guard = self.raw.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(position) = locate(&guard.task, index, task) else {
            warn!(task_index = index, "task no longer in config; not disabling");
            return Ok(false);
        };
        guard.task[position].common_mut().skip = true;
        Ok(true)
    }
}
