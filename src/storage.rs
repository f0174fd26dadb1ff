//! Document storage
//!
//! A path-keyed view of template source, rooted at a project directory.
//! Every stage of the engine reads "current text" from here and nowhere
//! else; editor-lifecycle events and explicit file notifications mutate
//! it. Updates are whole-content replacements.

use std::io;
use std::path::{Path, PathBuf};

use dashmap::DashMap;

/// Path-keyed source of truth for document text. Paths are relative to
/// the project root.
pub trait Storage: Send + Sync {
    /// Current text for `path`, or `None` when absent.
    fn read(&self, path: &Path) -> Option<String>;

    /// Replace the full text for `path`, creating it when absent.
    fn write(&self, path: &Path, text: &str) -> io::Result<()>;

    /// Drop `path` entirely.
    fn remove(&self, path: &Path) -> io::Result<()>;

    /// Every known template path, sorted.
    fn paths(&self) -> Vec<PathBuf>;
}

/// Purely in-memory storage; backs the language-server session, where the
/// editor's buffers are the truth.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    files: DashMap<PathBuf, String>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(files: impl IntoIterator<Item = (PathBuf, String)>) -> Self {
        let storage = Self::new();
        for (path, text) in files {
            storage.files.insert(path, text);
        }
        storage
    }
}

impl Storage for InMemoryStorage {
    fn read(&self, path: &Path) -> Option<String> {
        self.files.get(path).map(|entry| entry.clone())
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        self.files.insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.files.remove(path);
        Ok(())
    }

    fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.files.iter().map(|e| e.key().clone()).collect();
        paths.sort();
        paths
    }
}

/// Disk-backed storage rooted at a project directory, with a write-through
/// cache. Backs the batch CLI; `fix_all` persists rewritten templates
/// through it.
#[derive(Debug)]
pub struct FileSystemStorage {
    root: PathBuf,
    cache: DashMap<PathBuf, String>,
}

impl FileSystemStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn absolute(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }
}

impl Storage for FileSystemStorage {
    fn read(&self, path: &Path) -> Option<String> {
        if let Some(entry) = self.cache.get(path) {
            return Some(entry.clone());
        }
        let text = std::fs::read_to_string(self.absolute(path)).ok()?;
        self.cache.insert(path.to_path_buf(), text.clone());
        Some(text)
    }

    fn write(&self, path: &Path, text: &str) -> io::Result<()> {
        let absolute = self.absolute(path);
        if let Some(parent) = absolute.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&absolute, text)?;
        self.cache.insert(path.to_path_buf(), text.to_string());
        Ok(())
    }

    fn remove(&self, path: &Path) -> io::Result<()> {
        self.cache.remove(path);
        std::fs::remove_file(self.absolute(path))
    }

    fn paths(&self) -> Vec<PathBuf> {
        let pattern = self.root.join("**/*.liquid");
        let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())
            .into_iter()
            .flatten()
            .flatten()
            .filter_map(|p| p.strip_prefix(&self.root).ok().map(Path::to_path_buf))
            .collect();
        paths.sort();
        paths
    }
}
