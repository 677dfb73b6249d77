//! Directory walking for snapshot creation and source detection.
//!
//! Ignored directories are pruned while walking, so large dependency trees
//! such as `node_modules` are never descended into.
use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// File extension of snapshot archives; matching path components are skipped
/// so earlier snapshots are never archived recursively.
pub const SNAPSHOT_EXTENSION: &str = ".devsnap";

/// Path components excluded from every snapshot.
pub const DEFAULT_IGNORES: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    ".devsnap_sandbox",
    ".env",
    "dist",
    "build",
];

/// Extra components pruned when looking for source files to detect from.
const CODE_WALK_IGNORES: &[&str] = &["vendor"];

/// Source extensions considered by heuristic detection and secret scanning.
pub const CODE_EXTENSIONS: &[&str] = &["js", "ts", "jsx", "tsx", "go", "py"];

/// Set of path component names that exclude a path from a walk.
#[derive(Debug, Clone)]
pub struct IgnoreSet {
    names: BTreeSet<String>,
}

impl IgnoreSet {
    /// Ignore set used when collecting files to archive.
    pub fn for_snapshot(extra: &[String]) -> Self {
        let mut names: BTreeSet<String> =
            DEFAULT_IGNORES.iter().map(|name| name.to_string()).collect();
        names.extend(extra.iter().cloned());
        Self { names }
    }

    /// Snapshot ignore set plus vendored dependency directories.
    pub fn for_code_walk(extra: &[String]) -> Self {
        let mut set = Self::for_snapshot(extra);
        set.names
            .extend(CODE_WALK_IGNORES.iter().map(|name| name.to_string()));
        set
    }

    pub fn is_ignored(&self, component: &OsStr) -> bool {
        let component = component.to_string_lossy();
        self.names.contains(component.as_ref()) || component.ends_with(SNAPSHOT_EXTENSION)
    }

    fn admits(&self, entry: &DirEntry) -> bool {
        // The walk root itself is never filtered, only what lies beneath it.
        entry.depth() == 0 || !self.is_ignored(entry.file_name())
    }
}

/// Return every file under `root` that survives the ignore set, in a
/// deterministic depth-first, name-sorted order.
///
/// Filesystem errors abort the scan.
pub fn scan_directory(root: &Path, ignores: &IgnoreSet) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| ignores.admits(entry));
    for entry in walker {
        let entry = entry.with_context(|| format!("scan {}", root.display()))?;
        if is_file_entry(&entry) {
            files.push(entry.into_path());
        }
    }
    tracing::debug!(root = %root.display(), files = files.len(), "scan complete");
    Ok(files)
}

/// Collect source files for detection; unreadable entries are skipped.
pub fn collect_code_files(root: &Path, ignores: &IgnoreSet) -> Vec<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| ignores.admits(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                tracing::debug!(error = %err, "skipping unreadable entry during detection");
                None
            }
        })
        .filter(|entry| is_file_entry(entry) && has_code_extension(entry.path()))
        .map(DirEntry::into_path)
        .collect()
}

fn is_file_entry(entry: &DirEntry) -> bool {
    entry.file_type().is_file() || (entry.path_is_symlink() && entry.path().is_file())
}

/// Case-insensitive match against [`CODE_EXTENSIONS`].
pub fn has_code_extension(path: &Path) -> bool {
    extension_in(path, CODE_EXTENSIONS)
}

pub fn extension_in(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            extensions.iter().any(|candidate| *candidate == ext)
        })
        .unwrap_or(false)
}
