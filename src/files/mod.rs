// src/files/mod.rs

//! File selection and relocation.
//!
//! - [`targets`] decides which filenames in a set of folders belong to a task.
//! - [`relocate`] moves or deletes batches of files through the retry
//!   executor.

pub mod relocate;
pub mod targets;

pub use relocate::{DeleteReport, MoveReport, Relocator};
pub use targets::{TargetFiles, TargetFilter, enumerate_targets};
