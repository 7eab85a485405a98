use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use walkdir::{DirEntry, WalkDir};

/// Directories never descended into in recursive mode.
const SKIP_DIRS: &[&str] = &["node_modules"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    pub path: PathBuf,
    /// Path relative to the listed directory, `/`-separated.
    pub name: String,
    pub is_file: bool,
}

/// Where source text comes from and goes back to.
pub trait SourceStore {
    fn list(&self, directory: &Path, recursive: bool) -> Result<Vec<SourceEntry>>;
    fn read(&self, path: &Path) -> Result<String>;
    fn write(&self, path: &Path, text: &str) -> Result<()>;
}

/// [`SourceStore`] over the local file system.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStore;

impl SourceStore for FsStore {
    fn list(&self, directory: &Path, recursive: bool) -> Result<Vec<SourceEntry>> {
        if !directory.is_dir() {
            bail!("directory not found: {}", directory.display());
        }

        let max_depth = if recursive { usize::MAX } else { 1 };
        let walker = WalkDir::new(directory)
            .min_depth(1)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !is_skipped_dir(entry));

        let mut entries = Vec::new();
        for entry in walker {
            let entry = entry.with_context(|| format!("failed to list {}", directory.display()))?;
            let relative = entry
                .path()
                .strip_prefix(directory)
                .unwrap_or(entry.path());
            entries.push(SourceEntry {
                path: entry.path().to_path_buf(),
                name: normalize_separators(&relative.to_string_lossy()),
                is_file: entry.file_type().is_file(),
            });
        }
        Ok(entries)
    }

    fn read(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
    }
}

fn is_skipped_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name.starts_with('.') || SKIP_DIRS.contains(&name.as_ref())
}

pub fn normalize_separators(path: &str) -> String {
    path.replace('\\', "/")
}
