//! Deployment publishing
//!
//! Copies produced artifacts into an external deployment tree when one is
//! configured and was present at startup. Absence of the tree is a silent
//! no-op, never an error.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::Config;
use crate::copier::CopySpec;

/// Publisher for release artifacts and generated docs
#[derive(Debug)]
pub struct Publisher {
    artifact_dir: Option<PathBuf>,
    docs_dir: Option<PathBuf>,
    available: bool,
}

impl Publisher {
    pub fn from_config(config: &Config) -> Self {
        let artifact_dir = config.deploy_dir.as_ref().map(|d| {
            d.join("releases")
                .join(&config.name)
                .join(&config.version)
        });
        let docs_dir = config.deploy_dir.as_ref().map(|d| {
            d.join("developer")
                .join("api")
                .join(format!("{}{}", config.name, config.version))
        });

        Self {
            artifact_dir,
            docs_dir,
            available: config.deploy_available,
        }
    }

    /// Whether the deployment tree was present at startup
    pub fn available(&self) -> bool {
        self.available
    }

    /// Copy artifact files into the deployment tree. Files that do not
    /// exist (e.g. archives skipped by the archiver) are passed over.
    pub fn publish_artifacts(&self, files: &[PathBuf]) -> Result<()> {
        let Some(target) = self.target(self.artifact_dir.as_deref()) else {
            return Ok(());
        };

        fs::create_dir_all(target)
            .with_context(|| format!("Failed to create deploy directory: {}", target.display()))?;

        for file in files {
            if !file.is_file() {
                debug!("Skipping absent artifact: {}", file.display());
                continue;
            }
            let name = file
                .file_name()
                .context("Artifact path has no file name")?;
            fs::copy(file, target.join(name))
                .with_context(|| format!("Failed to deploy {}", file.display()))?;
        }

        info!("Artifacts deployed to {}", target.display());
        Ok(())
    }

    /// Copy a generated docs tree into the deployment tree
    pub fn publish_docs(&self, docs: &Path) -> Result<()> {
        let Some(target) = self.target(self.docs_dir.as_deref()) else {
            return Ok(());
        };

        if !docs.is_dir() {
            debug!("No docs to deploy at {}", docs.display());
            return Ok(());
        }

        CopySpec::new(docs, target, &[])?.run()?;
        info!("Docs deployed to {}", target.display());
        Ok(())
    }

    fn target<'a>(&self, dir: Option<&'a Path>) -> Option<&'a Path> {
        if !self.available {
            debug!("Deployment directory not available; skipping");
            return None;
        }
        dir
    }
}
