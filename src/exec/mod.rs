// src/exec/mod.rs

//! Worker execution layer.
//!
//! - [`job`] defines the descriptor handed across the process boundary.
//! - [`backend`] provides the `WorkerBackend` trait and the production
//!   `ProcessWorkerBackend`, which tests can replace with a fake.
//! - [`worker_process`] runs one worker via `tokio::process::Command`.
//! - [`dispatcher`] turns one task into at most one worker run.

pub mod backend;
pub mod dispatcher;
pub mod job;
pub mod worker_process;

pub use backend::{ProcessWorkerBackend, WorkerBackend, WorkerOutcome};
pub use dispatcher::{Clock, DispatchOutcome, Dispatcher};
pub use job::{JobDescriptor, JobSettings};
