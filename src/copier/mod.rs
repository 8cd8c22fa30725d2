//! Filtered tree copy
//!
//! Copies a resource tree into the build workspace, honoring exclude
//! patterns and an optional per-file content filter. Excluded directories
//! are pruned so the walk never descends into them.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use tracing::debug;
use walkdir::WalkDir;

/// Content filter applied to each text file during copy
pub type ContentFilter<'a> = &'a dyn Fn(&str) -> String;

/// One filesystem copy operation
pub struct CopySpec {
    source_root: PathBuf,
    destination: PathBuf,
    exclude: GlobSet,
}

impl CopySpec {
    /// Build a copy spec; `exclude` patterns are globs matched against
    /// paths relative to `source_root`
    pub fn new(
        source_root: impl Into<PathBuf>,
        destination: impl Into<PathBuf>,
        exclude: &[String],
    ) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude {
            let glob = Glob::new(pattern)
                .with_context(|| format!("Invalid exclude pattern: {pattern}"))?;
            builder.add(glob);
        }

        Ok(Self {
            source_root: source_root.into(),
            destination: destination.into(),
            exclude: builder.build().context("Failed to build exclude set")?,
        })
    }

    /// Copy the tree byte-for-byte
    pub fn run(&self) -> Result<usize> {
        self.run_filtered(None)
    }

    /// Copy the tree, passing each file's content through `filter` when one
    /// is given. Binary files (invalid UTF-8) fall back to a raw copy.
    ///
    /// The build pipeline stamps its descriptors through
    /// [`crate::manifest::stamp`] after the copy, so placeholder resolution
    /// is checked for completeness there; this hook is the copy-time
    /// transform for callers embedding the copier directly.
    pub fn run_filtered(&self, filter: Option<ContentFilter<'_>>) -> Result<usize> {
        let mut copied = 0;

        let walker = WalkDir::new(&self.source_root).into_iter();
        for entry in walker.filter_entry(|e| !self.is_excluded(e.path())) {
            let entry = entry.context("Failed to walk source tree")?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(&self.source_root)
                .context("Walked path escaped the source root")?;
            let dest = self.destination.join(relative);

            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }

            copy_file(entry.path(), &dest, filter)?;
            copied += 1;
        }

        debug!(
            "Copied {} file(s) from {} to {}",
            copied,
            self.source_root.display(),
            self.destination.display()
        );

        Ok(copied)
    }

    fn is_excluded(&self, path: &Path) -> bool {
        let relative = match path.strip_prefix(&self.source_root) {
            Ok(r) => r,
            Err(_) => return false,
        };
        if relative.as_os_str().is_empty() {
            return false;
        }
        self.exclude.is_match(relative)
    }
}

/// Copy a single file, optionally through a content filter
pub fn copy_file(source: &Path, dest: &Path, filter: Option<ContentFilter<'_>>) -> Result<()> {
    if let Some(filter) = filter {
        match fs::read_to_string(source) {
            Ok(content) => {
                fs::write(dest, filter(&content))
                    .with_context(|| format!("Failed to write file: {}", dest.display()))?;
                return Ok(());
            }
            // Not text; fall through to the raw copy
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {}
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to read file: {}", source.display()));
            }
        }
    }

    fs::copy(source, dest).with_context(|| {
        format!(
            "Failed to copy {} to {}",
            source.display(),
            dest.display()
        )
    })?;

    Ok(())
}
