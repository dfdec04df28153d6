//! File store abstraction.
//!
//! The engine only ever talks to a [`FileStore`]: read a document, list
//! documents recursively, write a document back. [`LocalStore`] maps these to
//! the local filesystem; [`MemoryStore`] keeps everything in memory and
//! records every write.
//!
//! ## `LocalStore::write`: atomic protocol
//!
//! 1. Ensure the parent directory exists.
//! 2. Write to `<path>.roster.tmp` in the same directory.
//! 3. Rename to the final path (atomic on POSIX).
//! 4. On rename failure, remove the temp file; the original stays intact.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use glob::{MatchOptions, Pattern};

use crate::error::{store_err, StoreError};

/// Result of a recursive listing.
#[derive(Debug, Default)]
pub struct Listing {
    /// Matching documents, sorted lexicographically.
    pub paths: Vec<PathBuf>,
    /// Sub-directories that could not be listed. The root itself is never here.
    pub failures: Vec<(PathBuf, StoreError)>,
}

impl Listing {
    fn fail(&mut self, path: &Path, source: std::io::Error) {
        tracing::warn!(path = %path.display(), error = %source, "cannot list entry");
        self.failures.push((path.to_path_buf(), store_err(path, source)));
    }
}

/// Storage the sync engine reads profiles from and writes them back to.
pub trait FileStore: Send + Sync {
    /// Human-readable description for the connect trace event.
    fn describe(&self) -> String;

    /// Read a whole document as UTF-8 text.
    fn read(&self, path: &Path) -> Result<String, StoreError>;

    /// Recursively list documents under `root` whose file name matches `pattern`.
    ///
    /// Fails only when `root` itself is missing or unreadable.
    fn list(&self, root: &Path, pattern: &Pattern) -> Result<Listing, StoreError>;

    /// Replace a document's content. Must be atomic from the caller's view.
    fn write(&self, path: &Path, content: &str) -> Result<(), StoreError>;
}

fn name_matches(path: &Path, pattern: &Pattern) -> bool {
    let options = MatchOptions {
        case_sensitive: true,
        require_literal_separator: false,
        require_literal_leading_dot: false,
    };
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| pattern.matches_with(name, options))
}

// ---------------------------------------------------------------------------
// LocalStore
// ---------------------------------------------------------------------------

/// Filesystem-backed store. Paths are used as given.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStore;

impl LocalStore {
    pub fn new() -> Self {
        Self
    }
}

impl FileStore for LocalStore {
    fn describe(&self) -> String {
        "local filesystem".to_string()
    }

    fn read(&self, path: &Path) -> Result<String, StoreError> {
        std::fs::read_to_string(path).map_err(|e| store_err(path, e))
    }

    fn list(&self, root: &Path, pattern: &Pattern) -> Result<Listing, StoreError> {
        let meta = std::fs::metadata(root).map_err(|e| store_err(root, e))?;
        if !meta.is_dir() {
            return Err(StoreError::NotADirectory {
                path: root.to_path_buf(),
            });
        }

        let mut listing = Listing::default();
        let mut pending = vec![root.to_path_buf()];
        while let Some(dir) = pending.pop() {
            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(e) if dir == root => return Err(store_err(root, e)),
                Err(e) => {
                    listing.fail(&dir, e);
                    continue;
                }
            };
            for entry in entries {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(e) => {
                        listing.fail(&dir, e);
                        continue;
                    }
                };
                let path = entry.path();
                let file_type = match entry.file_type() {
                    Ok(file_type) => file_type,
                    Err(e) => {
                        listing.fail(&path, e);
                        continue;
                    }
                };
                // Symlinked directories are not followed to avoid cycles.
                if file_type.is_dir() {
                    pending.push(path);
                } else if (file_type.is_file() || path.is_file()) && name_matches(&path, pattern) {
                    listing.paths.push(path);
                }
            }
        }

        listing.paths.sort();
        listing.paths.dedup();
        listing.failures.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(listing)
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        let tmp = PathBuf::from(format!("{}.roster.tmp", path.display()));
        write_with_tmp(path, content, &tmp)
    }
}

fn write_with_tmp(path: &Path, content: &str, tmp: &Path) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| store_err(parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| store_err(tmp, e))?;

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(store_err(path, e));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MemoryState {
    files: BTreeMap<PathBuf, String>,
    dirs: BTreeSet<PathBuf>,
    deny_read: HashSet<PathBuf>,
    deny_write: HashSet<PathBuf>,
    deny_list: BTreeSet<PathBuf>,
    writes: Vec<PathBuf>,
}

/// In-memory store. Every successful or attempted `write` is recorded.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add or replace a document; its ancestor directories come into existence.
    pub fn insert(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        let path = path.into();
        let mut state = self.state();
        for ancestor in path.ancestors().skip(1) {
            state.dirs.insert(ancestor.to_path_buf());
        }
        state.files.insert(path, content.into());
    }

    /// Create an empty directory.
    pub fn insert_dir(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut state = self.state();
        for ancestor in path.ancestors() {
            state.dirs.insert(ancestor.to_path_buf());
        }
    }

    /// Make `read` of `path` fail with [`StoreError::AccessDenied`].
    pub fn deny_read(&self, path: impl Into<PathBuf>) {
        self.state().deny_read.insert(path.into());
    }

    /// Make `write` of `path` fail with [`StoreError::AccessDenied`].
    pub fn deny_write(&self, path: impl Into<PathBuf>) {
        self.state().deny_write.insert(path.into());
    }

    /// Make listing `dir` fail with [`StoreError::AccessDenied`]. Documents
    /// below it are hidden from `list`.
    pub fn deny_list(&self, dir: impl Into<PathBuf>) {
        self.state().deny_list.insert(dir.into());
    }

    /// Current content of a document.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.state().files.get(path.as_ref()).cloned()
    }

    /// Paths passed to `write`, in call order.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.state().writes.clone()
    }
}

impl FileStore for MemoryStore {
    fn describe(&self) -> String {
        "in-memory store".to_string()
    }

    fn read(&self, path: &Path) -> Result<String, StoreError> {
        let state = self.state();
        if state.deny_read.contains(path) {
            return Err(StoreError::AccessDenied {
                path: path.to_path_buf(),
            });
        }
        state
            .files
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                path: path.to_path_buf(),
            })
    }

    fn list(&self, root: &Path, pattern: &Pattern) -> Result<Listing, StoreError> {
        let state = self.state();
        if !state.dirs.contains(root) {
            let path = root.to_path_buf();
            return Err(if state.files.contains_key(root) {
                StoreError::NotADirectory { path }
            } else {
                StoreError::NotFound { path }
            });
        }
        if state.deny_list.contains(root) {
            return Err(StoreError::AccessDenied {
                path: root.to_path_buf(),
            });
        }

        let denied: Vec<&PathBuf> = state
            .deny_list
            .iter()
            .filter(|d| d.starts_with(root) && state.dirs.contains(*d))
            .collect();
        let paths = state
            .files
            .keys()
            .filter(|p| p.starts_with(root) && name_matches(p, pattern))
            .filter(|p| !denied.iter().any(|d| p.starts_with(d)))
            .cloned()
            .collect();
        let failures = denied
            .into_iter()
            .map(|d| (d.clone(), StoreError::AccessDenied { path: d.clone() }))
            .collect();
        Ok(Listing { paths, failures })
    }

    fn write(&self, path: &Path, content: &str) -> Result<(), StoreError> {
        let mut state = self.state();
        state.writes.push(path.to_path_buf());
        if state.deny_write.contains(path) {
            return Err(StoreError::AccessDenied {
                path: path.to_path_buf(),
            });
        }
        state.files.insert(path.to_path_buf(), content.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
