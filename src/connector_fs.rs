//! Filesystem document source.
//!
//! Walks a directory tree in sorted order, skipping ignored directory names
//! and keeping files whose name ends with an accepted extension. The
//! keep/skip decisions live in [`SourceFilter`], which touches no files and
//! is tested on its own.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::extract::DocumentKind;

/// One file selected for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Path relative to the source root, `/`-separated.
    pub identifier: String,
    pub path: PathBuf,
    pub kind: DocumentKind,
}

/// Anything that can enumerate documents and load their bytes.
///
/// `entries` is lazy so large trees are never materialized up front;
/// per-entry errors are yielded rather than aborting the walk.
pub trait DocumentSource: Send + Sync {
    /// Human-readable location, for logs and reports.
    fn describe(&self) -> String;

    fn entries(&self) -> Box<dyn Iterator<Item = Result<SourceEntry>> + '_>;

    fn read(&self, entry: &SourceEntry) -> Result<Vec<u8>>;
}

/// Pure keep/skip rules for a directory walk.
#[derive(Debug, Clone)]
pub struct SourceFilter {
    extensions: Vec<String>,
    ignore_dirs: Vec<String>,
    exclude: GlobSet,
}

impl SourceFilter {
    pub fn new(
        extensions: &[String],
        ignore_dirs: &[String],
        exclude_globs: &[String],
    ) -> Result<Self> {
        if extensions.is_empty() {
            bail!("at least one file extension is required");
        }
        Ok(Self {
            extensions: extensions.to_vec(),
            ignore_dirs: ignore_dirs.to_vec(),
            exclude: build_globset(exclude_globs)?,
        })
    }

    /// Whether a walk should enter the directory called `name`.
    pub fn descend_into(&self, name: &str) -> bool {
        !self.ignore_dirs.iter().any(|d| d == name)
    }

    /// Whether the file at `relative` (from the root) is ingested.
    pub fn accepts(&self, relative: &Path) -> bool {
        let Some(name) = relative.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|ext| name.ends_with(ext.as_str()))
            && !self.exclude.is_match(relative)
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern).with_context(|| format!("invalid glob '{}'", pattern))?);
    }
    Ok(builder.build()?)
}

/// A local directory tree.
pub struct FsSource {
    root: PathBuf,
    filter: SourceFilter,
    max_file_bytes: u64,
}

impl FsSource {
    /// Fails if `root` is not an existing directory.
    pub fn new(root: impl Into<PathBuf>, filter: SourceFilter, max_file_bytes: u64) -> Result<Self> {
        let root = root.into();
        if !root.is_dir() {
            bail!("source directory does not exist: {}", root.display());
        }
        Ok(Self {
            root,
            filter,
            max_file_bytes,
        })
    }
}

impl DocumentSource for FsSource {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn entries(&self) -> Box<dyn Iterator<Item = Result<SourceEntry>> + '_> {
        let root = &self.root;
        let filter = &self.filter;
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(move |e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || filter.descend_into(&e.file_name().to_string_lossy())
            });

        Box::new(walker.filter_map(move |entry| {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => return Some(Err(e.into())),
            };
            if !entry.file_type().is_file() {
                return None;
            }
            let path = entry.path();
            let relative = path.strip_prefix(root).unwrap_or(path);
            if !filter.accepts(relative) {
                return None;
            }
            let identifier = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            Some(Ok(SourceEntry {
                identifier,
                path: path.to_path_buf(),
                kind: DocumentKind::from_path(path),
            }))
        }))
    }

    fn read(&self, entry: &SourceEntry) -> Result<Vec<u8>> {
        let size = std::fs::metadata(&entry.path)
            .with_context(|| format!("cannot stat {}", entry.path.display()))?
            .len();
        if size > self.max_file_bytes {
            bail!(
                "file is {} bytes, above the {} byte limit",
                size,
                self.max_file_bytes
            );
        }
        std::fs::read(&entry.path).with_context(|| format!("cannot read {}", entry.path.display()))
    }
}
