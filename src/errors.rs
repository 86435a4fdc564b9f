// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::TaskCategory;

#[derive(Error, Debug)]
pub enum LanekeeperError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerError(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Unknown task category: {0}")]
    UnknownCategory(String),

    #[error("{context}: gave up after {attempts} attempts: {message}")]
    RetriesExhausted {
        context: String,
        attempts: u32,
        message: String,
    },

    #[error("failed to start {category} worker: {message}")]
    WorkerSpawn {
        category: TaskCategory,
        message: String,
    },

    #[error("{category} worker exited with code {code}")]
    WorkerFailed { category: TaskCategory, code: i32 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LanekeeperError>;
