// src/files/relocate.rs

//! Moving and deleting batches of files.
//!
//! Every item in a batch is handled on its own: a missing file is a warning,
//! a file that keeps failing is a terminal failure recorded by the retry
//! executor, and neither stops the rest of the batch. Nothing is rolled back.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error_log::ErrorLog;
use crate::files::targets::TargetFiles;
use crate::fs::FileSystem;
use crate::retry::{RetryPolicy, retry};

/// Outcome of a `move_files` batch, by filename.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoveReport {
    pub moved: Vec<String>,
    pub missing: Vec<String>,
    pub failed: Vec<String>,
}

impl MoveReport {
    fn merge(&mut self, other: MoveReport) {
        self.moved.extend(other.moved);
        self.missing.extend(other.missing);
        self.failed.extend(other.failed);
    }
}

/// Outcome of a `delete_files` batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeleteReport {
    pub deleted: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct Relocator {
    fs: Arc<dyn FileSystem>,
    policy: RetryPolicy,
    errors: ErrorLog,
}

impl Relocator {
    pub fn new(fs: Arc<dyn FileSystem>, policy: RetryPolicy, errors: ErrorLog) -> Self {
        Self { fs, policy, errors }
    }

    /// Move `filenames` from `from` into `to`, each under the retry policy.
    ///
    /// `to` must already exist.
    pub async fn move_files(&self, filenames: &[String], from: &Path, to: &Path) -> MoveReport {
        let mut report = MoveReport::default();

        for name in filenames {
            let source = from.join(name);
            if !self.fs.exists(&source) {
                warn!(path = ?source, "can not find file to move; skipping");
                report.missing.push(name.clone());
                continue;
            }

            let dest = to.join(name);
            let fs = self.fs.as_ref();
            let (src_ref, dest_ref) = (source.as_path(), dest.as_path());
            let context = format!("move_file {:?} -> {:?}", source, dest);

            match retry(self.policy, &self.errors, &context, move || async move {
                move_file(fs, src_ref, dest_ref)
            })
            .await
            {
                Ok(()) => {
                    debug!(from = ?source, to = ?dest, "moved file");
                    report.moved.push(name.clone());
                }
                Err(_) => report.failed.push(name.clone()),
            }
        }

        report
    }

    /// Move every file listed in `targets` into `to`. Source folders are
    /// handled one after another.
    pub async fn move_targets(&self, targets: &TargetFiles, to: &Path) -> MoveReport {
        let mut report = MoveReport::default();
        for (source, names) in targets {
            info!(from = ?source, to = ?to, count = names.len(), "moving files");
            report.merge(self.move_files(names, source, to).await);
        }
        report
    }

    /// Best-effort unlink of every path. Already-absent paths only warn.
    pub fn delete_files(&self, paths: &[PathBuf]) -> DeleteReport {
        let mut report = DeleteReport::default();

        for path in paths {
            match self.fs.remove_file(path) {
                Ok(()) => {
                    debug!(path = ?path, "deleted file");
                    report.deleted.push(path.clone());
                }
                Err(err) if err.kind() == io::ErrorKind::NotFound => {
                    warn!(path = ?path, "can not find file to delete; skipping");
                    report.missing.push(path.clone());
                }
                Err(err) => {
                    self.errors
                        .record("delete_file", format!("can not delete {:?}: {err}", path));
                    report.failed.push(path.clone());
                }
            }
        }

        report
    }
}

/// Rename, falling back to copy-then-delete across filesystems.
fn move_file(fs: &dyn FileSystem, from: &Path, to: &Path) -> io::Result<()> {
    match fs.rename(from, to) {
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            debug!(from = ?from, to = ?to, "cross-device move; copying then removing source");
            fs.copy(from, to)?;
            fs.remove_file(from)
        }
        other => other,
    }
}
