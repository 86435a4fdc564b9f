// src/files/targets.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::fs::FileSystem;

/// Filenames selected per directory. Directories without matches are absent.
pub type TargetFiles = BTreeMap<PathBuf, Vec<String>>;

/// Inclusion/exclusion rules applied to bare filenames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TargetFilter {
    /// Extension allow-list, without the dot. Empty rejects everything.
    pub include_ext: Vec<String>,
    /// If non-empty, the filename must contain at least one of these.
    pub includes: Vec<String>,
    /// The filename must contain none of these.
    pub excludes: Vec<String>,
}

impl TargetFilter {
    pub fn matches(&self, filename: &str) -> bool {
        self.is_included(filename) && self.has_allowed_ext(filename) && !self.is_excluded(filename)
    }

    fn is_included(&self, filename: &str) -> bool {
        self.includes.is_empty() || self.includes.iter().any(|s| filename.contains(s.as_str()))
    }

    fn has_allowed_ext(&self, filename: &str) -> bool {
        Path::new(filename)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.include_ext.iter().any(|allowed| allowed == ext))
    }

    fn is_excluded(&self, filename: &str) -> bool {
        self.excludes.iter().any(|s| filename.contains(s.as_str()))
    }
}

/// List the regular files in each of `dirs` that pass `filter`.
///
/// Filenames are sorted so repeated calls over an unchanged directory return
/// identical results. Reading a directory that does not exist is an error.
pub fn enumerate_targets(
    fs: &dyn FileSystem,
    dirs: &[PathBuf],
    filter: &TargetFilter,
) -> Result<TargetFiles> {
    let mut targets = TargetFiles::new();

    for dir in dirs {
        let mut names: Vec<String> = fs
            .read_dir(dir)?
            .into_iter()
            .filter(|path| fs.is_file(path))
            .filter_map(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .map(str::to_string)
            })
            .filter(|name| filter.matches(name))
            .collect();

        if names.is_empty() {
            continue;
        }

        names.sort();
        targets.insert(dir.clone(), names);
    }

    Ok(targets)
}
