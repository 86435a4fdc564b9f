// src/config/mod.rs

//! Configuration loading and validation for lanekeeper.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`, `task.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants (`validate.rs`).
//! - Abstract the durable store that is re-read every tick (`source.rs`).

pub mod loader;
pub mod model;
pub mod source;
pub mod task;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, parse_str};
pub use model::{
    CategoryDefaults, ConfigFile, ConfigSection, ExecutableTime, RawConfigFile, RetrySection,
    TimeOfDay, WorkerConfig, WorkersSection,
};
pub use source::{ConfigSource, FileConfigSource, MemoryConfigSource};
pub use task::{MergeTask, RelocateTask, Task, TaskCommon, TransformTask, UploadTask};
