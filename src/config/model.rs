// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Offset, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::config::task::Task;
use crate::retry::RetryPolicy;
use crate::types::WorkerKind;

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// pause = false
/// check_interval = 60
///
/// [worker.transform]
/// cmd = "node dist/scripts/convert.js"
///
/// [[task]]
/// type = "transform"
/// source_folders = ["/srv/incoming"]
/// include_ext = ["mp4"]
/// working_folder = "/srv/work"
/// output_folder = "/srv/done"
/// ```
///
/// All sections except the task list are optional and have defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub retry: RetrySection,

    /// Worker commands from `[worker.<kind>]`.
    #[serde(default)]
    pub worker: WorkersSection,

    /// Per-category defaults (`[transform]`, `[merge]`, `[split]`,
    /// `[screenshot]`, `[upload]`).
    #[serde(flatten)]
    pub defaults: CategoryDefaults,

    /// All tasks from `[[task]]`, in config order.
    #[serde(default)]
    pub task: Vec<Task>,
}

/// Validated configuration snapshot.
///
/// Only obtainable through `TryFrom<RawConfigFile>`, so holding one means the
/// invariants in `validate.rs` were checked. A snapshot is immutable for the
/// duration of one tick.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub retry: RetrySection,
    pub worker: WorkersSection,
    pub defaults: CategoryDefaults,
    pub task: Vec<Task>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            retry: raw.retry,
            worker: raw.worker,
            defaults: raw.defaults,
            task: raw.task,
        }
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.config.check_interval)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// When true, ticks do nothing but re-arm the timer.
    #[serde(default)]
    pub pause: bool,

    /// Seconds between ticks.
    #[serde(default = "default_check_interval")]
    pub check_interval: u64,

    /// Append-only JSON lines file receiving one record per terminal failure.
    #[serde(default = "default_error_log")]
    pub error_log: PathBuf,
}

fn default_check_interval() -> u64 {
    60
}

fn default_error_log() -> PathBuf {
    PathBuf::from("log/errors.jsonl")
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            pause: false,
            check_interval: default_check_interval(),
            error_log: default_error_log(),
        }
    }
}

/// `[retry]` section: policy for file moves.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct RetrySection {
    /// Additional attempts after the first failure.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

fn default_max_retries() -> u32 {
    5
}

fn default_delay_ms() -> u64 {
    1000
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_ms: default_delay_ms(),
        }
    }
}

impl RetrySection {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.delay_ms))
    }
}

/// `[worker.<kind>]` section.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Shell command started once per dispatched task.
    pub cmd: String,

    /// Persist `skip = true` on the task when its worker fails.
    #[serde(default)]
    pub disable_on_failure: bool,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct WorkersSection {
    #[serde(default)]
    pub transform: Option<WorkerConfig>,
    #[serde(default)]
    pub merge: Option<WorkerConfig>,
    #[serde(default)]
    pub upload: Option<WorkerConfig>,
}

impl WorkersSection {
    pub fn get(&self, kind: WorkerKind) -> Option<&WorkerConfig> {
        match kind {
            WorkerKind::Transform => self.transform.as_ref(),
            WorkerKind::Merge => self.merge.as_ref(),
            WorkerKind::Upload => self.upload.as_ref(),
        }
    }
}

/// Per-category defaults. The scheduler does not interpret these; they are
/// forwarded to workers inside the job descriptor.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CategoryDefaults {
    #[serde(default)]
    pub transform: TransformDefaults,
    #[serde(default)]
    pub merge: MergeDefaults,
    #[serde(default)]
    pub split: SplitDefaults,
    #[serde(default)]
    pub screenshot: ScreenshotDefaults,
    #[serde(default)]
    pub upload: UploadDefaults,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomSetting {
    pub ffmpeg_setting: String,
    pub suffix: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformDefaults {
    /// Output container extension.
    #[serde(default = "default_transform_ext")]
    pub ext: String,
    #[serde(default = "default_transform_suffix")]
    pub default_suffix: String,
    #[serde(default)]
    pub default_ffmpeg_setting: String,
    #[serde(default)]
    pub show_cmd: bool,
    #[serde(default)]
    pub custom_setting: BTreeMap<String, CustomSetting>,
}

fn default_transform_ext() -> String {
    "mp4".to_string()
}

fn default_transform_suffix() -> String {
    "_converted".to_string()
}

impl Default for TransformDefaults {
    fn default() -> Self {
        Self {
            ext: default_transform_ext(),
            default_suffix: default_transform_suffix(),
            default_ffmpeg_setting: String::new(),
            show_cmd: false,
            custom_setting: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeDefaults {
    #[serde(default = "default_merge_suffix")]
    pub suffix_for_combine: String,
    /// Separator used to group files by the prefix before it.
    #[serde(default = "default_file_name_clipper")]
    pub file_name_clipper: String,
    #[serde(default)]
    pub show_cmd: bool,
}

fn default_merge_suffix() -> String {
    "_combined".to_string()
}

fn default_file_name_clipper() -> String {
    "_".to_string()
}

impl Default for MergeDefaults {
    fn default() -> Self {
        Self {
            suffix_for_combine: default_merge_suffix(),
            file_name_clipper: default_file_name_clipper(),
            show_cmd: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitDefaults {
    #[serde(default = "default_split_interval")]
    pub split_interval_secs: u64,
    #[serde(default)]
    pub invalid_maximum_duration: Option<u64>,
    #[serde(default)]
    pub show_cmd: bool,
}

fn default_split_interval() -> u64 {
    3600
}

impl Default for SplitDefaults {
    fn default() -> Self {
        Self {
            split_interval_secs: default_split_interval(),
            invalid_maximum_duration: None,
            show_cmd: false,
        }
    }
}

/// A screenshot timestamp, either seconds or an `HH:MM:SS` string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScreenshotTimestamp {
    Seconds(f64),
    Clock(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ScreenshotDefaults {
    #[serde(default)]
    pub output_folder: Option<PathBuf>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub timestamps: Vec<ScreenshotTimestamp>,
    #[serde(default)]
    pub interval: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Credentials {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub pass: String,
    #[serde(default)]
    pub recovery_email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BrowserSetting {
    #[serde(default)]
    pub executable_path: Option<PathBuf>,
    #[serde(default)]
    pub headless: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeOfDay {
    pub hour: u32,
    #[serde(default)]
    pub min: u32,
}

impl TimeOfDay {
    fn minutes(&self) -> u32 {
        self.hour * 60 + self.min
    }
}

/// Daily window in which uploads may be dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutableTime {
    pub from: TimeOfDay,
    pub to: TimeOfDay,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

fn default_utc_offset_hours() -> i32 {
    8
}

impl ExecutableTime {
    /// Whether `now` falls inside the window (inclusive on both ends).
    ///
    /// A window whose `from` is later than its `to` spans midnight.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let offset =
            FixedOffset::east_opt(self.utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
        let local = now.with_timezone(&offset);
        let minute_of_day = local.hour() * 60 + local.minute();

        let from = self.from.minutes();
        let to = self.to.minutes();
        if from <= to {
            (from..=to).contains(&minute_of_day)
        } else {
            minute_of_day >= from || minute_of_day <= to
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UploadDefaults {
    #[serde(default)]
    pub show_progress: bool,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub browser: BrowserSetting,
    #[serde(default)]
    pub stream_list_path: Option<PathBuf>,
    #[serde(default)]
    pub skip_when_download_reach: Option<u32>,
    #[serde(default)]
    pub executable_time: Option<ExecutableTime>,
}
