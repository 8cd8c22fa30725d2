//! Configuration handling for extbuild
//!
//! Loads the package descriptor (package.json) and derives the filesystem
//! layout used for the rest of the run. Everything here is computed once at
//! startup and immutable afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// On-disk package descriptor. Only the fields the packager cares about.
#[derive(Debug, Clone, Deserialize)]
pub struct PackageManifest {
    /// Extension version, stamped into descriptor templates
    pub version: String,

    /// Package name, used for artifact filenames
    #[serde(default = "default_name")]
    pub name: String,

    /// Packaging options
    #[serde(default)]
    pub build: BuildSection,
}

fn default_name() -> String {
    "extension".to_string()
}

/// Optional `build` section of the package descriptor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BuildSection {
    /// Module roots searched when resolving bundle dependencies
    pub roots: Vec<String>,

    /// Entry modules whose dependency closure ends up in the bundle
    pub entries: Vec<String>,

    /// Extra exclude patterns for the resource copy
    pub exclude: Vec<String>,

    /// Release suffix appended to the version (e.g. "b1")
    pub release: String,

    /// External deployment tree, outside the repository
    pub deploy_dir: Option<String>,
}

impl Default for BuildSection {
    fn default() -> Self {
        Self {
            roots: vec!["content".to_string()],
            entries: Vec::new(),
            exclude: Vec::new(),
            release: String::new(),
            deploy_dir: None,
        }
    }
}

/// Resolved configuration, passed into each pipeline step
#[derive(Debug, Clone)]
pub struct Config {
    /// Package name
    pub name: String,

    /// Package version
    pub version: String,

    /// Release suffix, usually empty
    pub release: String,

    /// Project root (directory containing the package descriptor)
    pub root: PathBuf,

    /// Intermediate build workspace
    pub build_dir: PathBuf,

    /// Release output directory
    pub release_dir: PathBuf,

    /// Locale drop directory consumed by localized builds
    pub locale_dir: PathBuf,

    /// Module roots for the bundler
    pub module_roots: Vec<PathBuf>,

    /// Entry modules for the bundler
    pub entries: Vec<String>,

    /// Extra exclude patterns for the resource copy
    pub exclude: Vec<String>,

    /// External deployment tree, if configured
    pub deploy_dir: Option<PathBuf>,

    /// Checked once at startup; deployment is a silent no-op without it
    pub deploy_available: bool,
}

impl Config {
    /// Load configuration from a package descriptor path
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let canonical_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        let content = fs::read_to_string(&canonical_path).with_context(|| {
            format!(
                "Failed to read package descriptor: {}",
                canonical_path.display()
            )
        })?;

        let manifest: PackageManifest =
            serde_json::from_str(&content).with_context(|| "Failed to parse package descriptor")?;

        // Root is the directory containing the descriptor
        let root = canonical_path
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let deploy_dir = manifest.build.deploy_dir.as_ref().map(PathBuf::from);
        let deploy_available = deploy_dir.as_deref().is_some_and(Path::is_dir);

        let config = Self {
            name: manifest.name,
            version: manifest.version,
            release: manifest.build.release,
            build_dir: root.join("build"),
            release_dir: root.join("release"),
            locale_dir: root.join("bz-locale"),
            module_roots: manifest.build.roots.iter().map(|r| root.join(r)).collect(),
            entries: manifest.build.entries,
            exclude: manifest.build.exclude,
            deploy_dir,
            deploy_available,
            root,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            anyhow::bail!("Package descriptor has an empty version");
        }

        // Module roots only matter when there is something to bundle
        if !self.entries.is_empty() {
            for module_root in &self.module_roots {
                if !module_root.is_dir() {
                    anyhow::bail!(
                        "Module root does not exist: {}",
                        module_root.display()
                    );
                }
            }
        }

        Ok(())
    }

    /// Version plus release suffix, as stamped into descriptors
    pub fn version_tag(&self) -> String {
        format!("{}{}", self.version, self.release)
    }

    /// Artifact filename for a variant suffix ("" or "-amo" or "-bz")
    pub fn artifact_name(&self, variant: &str) -> String {
        format!("{}-{}{}.xpi", self.name, self.version_tag(), variant)
    }
}
