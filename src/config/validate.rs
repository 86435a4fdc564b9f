// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::task::Task;
use crate::errors::{LanekeeperError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::LanekeeperError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_tasks(cfg)?;
    validate_global_config(cfg)?;
    validate_tasks(cfg)?;
    validate_upload_window(cfg)?;
    Ok(())
}

fn ensure_has_tasks(cfg: &RawConfigFile) -> Result<()> {
    if cfg.task.is_empty() {
        return Err(LanekeeperError::ConfigError(
            "config must contain at least one [[task]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.check_interval == 0 {
        return Err(LanekeeperError::ConfigError(
            "[config].check_interval must be >= 1 second (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (index, task) in cfg.task.iter().enumerate() {
        let category = task.category();

        if task.destination().as_os_str().is_empty() {
            let field = match task {
                Task::Relocate(_) => "target_folder",
                _ => "working_folder",
            };
            return Err(LanekeeperError::ConfigError(format!(
                "task #{index} ({category}) has an empty `{field}`"
            )));
        }

        // Skipped tasks never reach a worker, so they may omit one.
        if let Some(kind) = category.worker_kind() {
            if !task.is_skipped() && cfg.worker.get(kind).is_none() {
                return Err(LanekeeperError::ConfigError(format!(
                    "task #{index} ({category}) needs a [worker.{kind}] command"
                )));
            }
        }
    }
    Ok(())
}

fn validate_upload_window(cfg: &RawConfigFile) -> Result<()> {
    let Some(window) = cfg.defaults.upload.executable_time else {
        return Ok(());
    };

    for (label, time) in [("from", window.from), ("to", window.to)] {
        if time.hour > 23 || time.min > 59 {
            return Err(LanekeeperError::ConfigError(format!(
                "[upload.executable_time].{label} is not a valid time of day ({}:{:02})",
                time.hour, time.min
            )));
        }
    }

    if !(-23..=23).contains(&window.utc_offset_hours) {
        return Err(LanekeeperError::ConfigError(format!(
            "[upload.executable_time].utc_offset_hours out of range: {}",
            window.utc_offset_hours
        )));
    }

    Ok(())
}
