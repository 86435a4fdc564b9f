// src/exec/backend.rs

//! Pluggable worker backend abstraction.
//!
//! The dispatcher talks to a `WorkerBackend` instead of spawning processes
//! directly. Production uses [`ProcessWorkerBackend`]; tests can provide their
//! own implementation that records descriptors and reports scripted outcomes
//! without starting any process.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::job::JobDescriptor;
use crate::exec::worker_process::run_worker_process;

/// Terminal signal from one worker run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerOutcome {
    Success,
    /// Non-zero exit. `-1` when the process ended without an exit code
    /// (e.g. killed by a signal).
    Failed(i32),
}

/// Trait abstracting how a job is run out-of-process.
///
/// Contract: exactly one descriptor is delivered per call and the returned
/// future resolves once, after the worker has finished. A worker that could
/// not be started is an `Err`.
pub trait WorkerBackend: Send + Sync {
    fn run_job(
        &self,
        cmd: &str,
        job: JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<WorkerOutcome>> + Send + '_>>;
}

/// Spawns one OS process per job via the platform shell.
#[derive(Debug, Clone, Default)]
pub struct ProcessWorkerBackend;

impl ProcessWorkerBackend {
    pub fn new() -> Self {
        Self
    }
}

impl WorkerBackend for ProcessWorkerBackend {
    fn run_job(
        &self,
        cmd: &str,
        job: JobDescriptor,
    ) -> Pin<Box<dyn Future<Output = Result<WorkerOutcome>> + Send + '_>> {
        // Own the command so the future doesn't borrow the caller's string.
        let cmd = cmd.to_string();
        Box::pin(async move { run_worker_process(&cmd, job).await })
    }
}
