use crate::replace::{RenameReplacer, Replacer};
use std::cell::Cell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestDir {
    // Keeps the directory alive until the test is done
    pub _temp_dir: TempDir,
    root: PathBuf,
}

impl Default for TestDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDir {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("failed to create temp dir");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }

    /// Create `name` with `content` and return its path.
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).expect("failed to write fixture");
        path
    }

    /// Staging files (default `.tmp` suffix) still present in the directory.
    pub fn leftover_staging(&self) -> Vec<PathBuf> {
        fs::read_dir(&self.root)
            .expect("failed to list temp dir")
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.ends_with(".tmp"))
            })
            .collect()
    }
}

/// Replacer whose every call fails with the given error kind.
pub struct FailingReplacer {
    kind: io::ErrorKind,
}

impl FailingReplacer {
    pub fn new(kind: io::ErrorKind) -> Self {
        Self { kind }
    }
}

impl Replacer for FailingReplacer {
    fn replace(&self, _src: &Path, _dst: &Path) -> io::Result<()> {
        Err(io::Error::new(self.kind, "simulated replace failure"))
    }
}

/// Rename-based replacer that counts how often it was called.
#[derive(Default)]
pub struct CountingReplacer {
    calls: Cell<usize>,
}

impl CountingReplacer {
    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl Replacer for CountingReplacer {
    fn replace(&self, src: &Path, dst: &Path) -> io::Result<()> {
        self.calls.set(self.calls.get() + 1);
        RenameReplacer.replace(src, dst)
    }
}
