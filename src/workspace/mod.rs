//! Build/release workspace lifecycle
//!
//! Every full build starts from a fresh workspace: `clean` then `prepare`.
//! Removal is idempotent; a directory that is absent is not an error, a
//! directory that cannot be removed is fatal.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::config::Config;

/// The build and release directories owned by one invocation
#[derive(Debug, Clone)]
pub struct Workspace {
    build_dir: PathBuf,
    release_dir: PathBuf,
}

impl Workspace {
    pub fn from_config(config: &Config) -> Self {
        Self {
            build_dir: config.build_dir.clone(),
            release_dir: config.release_dir.clone(),
        }
    }

    /// Remove both directories recursively if present
    pub fn clean(&self) -> Result<()> {
        remove_dir_if_present(&self.build_dir)?;
        remove_dir_if_present(&self.release_dir)?;
        Ok(())
    }

    /// Recreate both directories
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.build_dir).with_context(|| {
            format!("Failed to create build directory: {}", self.build_dir.display())
        })?;
        fs::create_dir_all(&self.release_dir).with_context(|| {
            format!(
                "Failed to create release directory: {}",
                self.release_dir.display()
            )
        })?;
        Ok(())
    }
}

/// Recursive remove that treats an absent path as already done
pub fn remove_dir_if_present(path: &Path) -> Result<()> {
    match fs::remove_dir_all(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove directory: {}", path.display()))
        }
    }
}

/// Remove a single file, ignoring absence
pub fn remove_file_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove file: {}", path.display())),
    }
}
