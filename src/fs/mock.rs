// src/fs/mock.rs

use super::FileSystem;
use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File(Vec<u8>),
    Dir(Vec<String>), // List of child names
}

#[derive(Debug, Default)]
struct MockState {
    files: HashMap<PathBuf, MockEntry>,
    /// Remaining injected failures per path, consumed by `rename`/`copy`/`remove_file`.
    failures: HashMap<PathBuf, (u32, io::ErrorKind)>,
    /// Paths under these roots live on a second "device".
    foreign_roots: Vec<PathBuf>,
}

/// In-memory filesystem with failure injection.
///
/// Clones share state, so a test can keep a handle while the code under test
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    state: Arc<Mutex<MockState>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut state = MockState::default();
        // Ensure root exists
        state
            .files
            .insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>) {
        let mut state = self.lock();
        insert_file(&mut state.files, path.as_ref(), content.into());
    }

    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut state = self.lock();
        ensure_dir_entry(&mut state.files, path.as_ref());
    }

    /// Make the next `times` mutating operations on `path` fail with `kind`.
    pub fn fail_next(&self, path: impl AsRef<Path>, times: u32, kind: io::ErrorKind) {
        let mut state = self.lock();
        state
            .failures
            .insert(path.as_ref().to_path_buf(), (times, kind));
    }

    /// Treat everything under `root` as a different device, so renames into
    /// or out of it fail with `CrossesDevices`.
    pub fn mount_foreign(&self, root: impl AsRef<Path>) {
        let mut state = self.lock();
        state.foreign_roots.push(root.as_ref().to_path_buf());
    }

    /// Sorted list of file names directly inside `dir`.
    pub fn file_names(&self, dir: impl AsRef<Path>) -> Vec<String> {
        let state = self.lock();
        let dir = dir.as_ref();
        let mut names: Vec<String> = match state.files.get(dir) {
            Some(MockEntry::Dir(children)) => children
                .iter()
                .filter(|name| matches!(state.files.get(&dir.join(name)), Some(MockEntry::File(_))))
                .cloned()
                .collect(),
            _ => Vec::new(),
        };
        names.sort();
        names
    }
}

fn parent_of(path: &Path) -> Option<&Path> {
    path.parent().map(|parent| {
        if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        }
    })
}

fn insert_file(files: &mut HashMap<PathBuf, MockEntry>, path: &Path, content: Vec<u8>) {
    files.insert(path.to_path_buf(), MockEntry::File(content));

    // Ensure parent directories exist implicitly for simplicity in this mock
    if let Some(parent) = parent_of(path) {
        ensure_dir_entry(files, parent);
        link_child(files, parent, path);
    }
}

fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    if files.contains_key(path) {
        return;
    }
    files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
    if let Some(parent) = parent_of(path) {
        if parent != path {
            // Avoid infinite loop at root
            ensure_dir_entry(files, parent);
            link_child(files, parent, path);
        }
    }
}

fn link_child(files: &mut HashMap<PathBuf, MockEntry>, parent: &Path, child: &Path) {
    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        if let Some(name) = child.file_name().and_then(|n| n.to_str()) {
            if !children.iter().any(|c| c == name) {
                children.push(name.to_string());
            }
        }
    }
}

fn unlink_child(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
    let Some(parent) = parent_of(path) else {
        return;
    };
    if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
        if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            children.retain(|c| c != name);
        }
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, format!("not found: {:?}", path))
}

impl MockState {
    fn take_failure(&mut self, path: &Path) -> io::Result<()> {
        if let Some((remaining, kind)) = self.failures.get_mut(path) {
            if *remaining > 0 {
                *remaining -= 1;
                return Err(io::Error::new(*kind, format!("injected failure on {:?}", path)));
            }
        }
        Ok(())
    }

    fn is_foreign(&self, path: &Path) -> bool {
        self.foreign_roots.iter().any(|root| path.starts_with(root))
    }

    fn file_contents(&self, path: &Path) -> io::Result<Vec<u8>> {
        match self.files.get(path) {
            Some(MockEntry::File(content)) => Ok(content.clone()),
            Some(MockEntry::Dir(_)) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {:?}", path),
            )),
            None => Err(not_found(path)),
        }
    }
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let state = self.lock();
        let content = state.file_contents(path)?;
        String::from_utf8(content).map_err(|e| anyhow!("Invalid UTF-8: {}", e))
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().files.contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().files.get(path), Some(MockEntry::File(_)))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().files.get(path), Some(MockEntry::Dir(_)))
    }

    fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.add_dir(path);
        Ok(())
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let state = self.lock();
        match state.files.get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(anyhow!("Not a directory or not found: {:?}", path)),
        }
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.take_failure(from)?;
        if state.is_foreign(from) != state.is_foreign(to) {
            return Err(io::Error::new(
                io::ErrorKind::CrossesDevices,
                format!("cross-device rename {:?} -> {:?}", from, to),
            ));
        }
        let content = state.file_contents(from)?;
        state.files.remove(from);
        unlink_child(&mut state.files, from);
        insert_file(&mut state.files, to, content);
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.take_failure(from)?;
        let content = state.file_contents(from)?;
        insert_file(&mut state.files, to, content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut state = self.lock();
        state.take_failure(path)?;
        match state.files.get(path) {
            Some(MockEntry::File(_)) => {
                state.files.remove(path);
                unlink_child(&mut state.files, path);
                Ok(())
            }
            Some(MockEntry::Dir(_)) => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("is a directory: {:?}", path),
            )),
            None => Err(not_found(path)),
        }
    }
}
