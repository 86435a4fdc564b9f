// src/error_log.rs

//! Append-only store of terminal failures.
//!
//! Every record is also emitted as an `error!` line, so the human-readable log
//! and the structured store never disagree. Failing to persist a record is
//! itself only logged; it never propagates into the caller.

use std::fmt::Debug;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

/// One terminal failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub message: String,
    /// Where the failure surfaced, e.g. `dispatch:merge` or `move_file`.
    pub context: String,
}

/// Destination for error records.
pub trait ErrorSink: Send + Sync + Debug {
    fn append(&self, record: &ErrorRecord) -> Result<()>;
}

/// JSON lines file, one record per line.
#[derive(Debug)]
pub struct JsonLinesSink {
    path: PathBuf,
    // Serializes appends from concurrently running lanes.
    write_lock: Mutex<()>,
}

impl JsonLinesSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ErrorSink for JsonLinesSink {
    fn append(&self, record: &ErrorRecord) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating error log dir {:?}", parent))?;
            }
        }

        let mut line = serde_json::to_string(record)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening error log {:?}", self.path))?;
        file.write_all(line.as_bytes())
            .with_context(|| format!("appending to error log {:?}", self.path))?;
        Ok(())
    }
}

/// Keeps records in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<ErrorRecord>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ErrorRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ErrorSink for MemorySink {
    fn append(&self, record: &ErrorRecord) -> Result<()> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }
}

/// Cheap, cloneable handle used throughout the crate.
#[derive(Debug, Clone)]
pub struct ErrorLog {
    sink: Arc<dyn ErrorSink>,
}

impl ErrorLog {
    pub fn new(sink: Arc<dyn ErrorSink>) -> Self {
        Self { sink }
    }

    pub fn json_lines(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(JsonLinesSink::new(path)))
    }

    pub fn record(&self, context: &str, message: impl Into<String>) {
        let record = ErrorRecord {
            timestamp: Utc::now(),
            message: message.into(),
            context: context.to_string(),
        };

        error!(context = %record.context, "{}", record.message);

        if let Err(err) = self.sink.append(&record) {
            warn!(error = %err, "failed to persist error record");
        }
    }
}
