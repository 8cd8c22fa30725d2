//! The packaging pipeline
//!
//! Sequences a full build: clean the workspace, copy and filter the
//! resource tree, bundle module sources, stamp descriptors, archive and
//! publish. Every step runs to completion before the next begins; the
//! first fatal I/O error aborts the run with no rollback.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::archive::Archiver;
use crate::bundler::{BundleOutput, Bundler};
use crate::config::Config;
use crate::copier::CopySpec;
use crate::deploy::Publisher;
use crate::docgen::DocGenerator;
use crate::manifest::{self, TemplateSubstitution, LEAF_TOKEN, RELEASE_TOKEN, VERSION_TOKEN};
use crate::workspace::{remove_file_if_present, Workspace};

/// Install manifest template, relative to the project root
const INSTALL_TEMPLATE: &str = "install.rdf.tpl.xml";

/// Update descriptor template, relative to the project root
const UPDATE_TEMPLATE: &str = "update.rdf.tpl.xml";

/// Localized chrome manifest template, shipped in the resource tree
const LOCALIZED_MANIFEST_TEMPLATE: &str = "chrome.bz.tpl.manifest";

/// What a pipeline run produced
#[derive(Debug, Default)]
pub struct PipelineReport {
    /// Artifact archive paths handed to the archiver, in creation order
    pub artifacts: Vec<PathBuf>,

    /// Path of the written update descriptor
    pub descriptor: Option<PathBuf>,

    /// Bundle summary, when entry modules were configured
    pub bundle: Option<BundleOutput>,
}

/// The packaging pipeline
pub struct Pipeline {
    config: Config,
    archiver: Box<dyn Archiver>,
}

impl Pipeline {
    pub fn new(config: Config, archiver: Box<dyn Archiver>) -> Self {
        Self { config, archiver }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Standard build: two artifact variants plus the update descriptor
    pub fn build(&self) -> Result<PipelineReport> {
        let mut report = self.prepare_build()?;

        // Stamp the install manifest with the release version info
        manifest::stamp(
            &self.config.root.join(INSTALL_TEMPLATE),
            &self.config.build_dir.join("install.rdf"),
            &self.substitutions(&self.config.release),
        )?;

        // The localized manifest template has no place in a standard build
        remove_file_if_present(&self.config.build_dir.join(LOCALIZED_MANIFEST_TEMPLATE))?;

        // Standard artifact, update URL intact
        report
            .artifacts
            .push(self.create_artifact(&self.config.artifact_name(""))?);

        // Restricted-distribution artifact: the curated channel runs its own
        // update mechanism, so the update URL must go
        manifest::strip_update_url_file(&self.config.build_dir.join("install.rdf"))?;
        report
            .artifacts
            .push(self.create_artifact(&self.config.artifact_name("-amo"))?);

        let descriptor = self.config.release_dir.join("update.rdf");
        let mut to_deploy = report.artifacts.clone();
        to_deploy.push(descriptor.clone());
        report.descriptor = Some(descriptor);

        Publisher::from_config(&self.config).publish_artifacts(&to_deploy)?;

        info!(
            "{} version {} packaged in {}",
            self.config.name,
            self.config.version_tag(),
            self.config.release_dir.display()
        );

        Ok(report)
    }

    /// Localized build: locale drop merged in and a "-bz" release tag
    pub fn localized_build(&self) -> Result<PipelineReport> {
        let mut report = self.prepare_build()?;
        let release = format!("{}-bz", self.config.release);

        // The localized chrome manifest replaces the standard one
        let template = self.config.build_dir.join(LOCALIZED_MANIFEST_TEMPLATE);
        if template.is_file() {
            fs::rename(&template, self.config.build_dir.join("chrome.manifest"))
                .context("Failed to install localized chrome manifest")?;
        }

        // Merge the locale drop, keeping the tree's own en-US
        if self.config.locale_dir.is_dir() {
            CopySpec::new(
                &self.config.locale_dir,
                self.config.build_dir.join("locale"),
                &["en-US/**".to_string()],
            )?
            .run()?;
        } else {
            debug!(
                "Locale directory not found: {}",
                self.config.locale_dir.display()
            );
        }

        manifest::stamp(
            &self.config.root.join(INSTALL_TEMPLATE),
            &self.config.build_dir.join("install.rdf"),
            &self.substitutions(&release),
        )?;

        report
            .artifacts
            .push(self.create_artifact(&self.config.artifact_name("-bz"))?);
        report.descriptor = Some(self.config.release_dir.join("update.rdf"));

        info!(
            "{} localized version {}-bz packaged in {}",
            self.config.name,
            self.config.version_tag(),
            self.config.release_dir.display()
        );

        Ok(report)
    }

    /// Standard build plus doc generation and doc deployment
    pub fn build_with_docs(&self, docgen: &dyn DocGenerator) -> Result<PipelineReport> {
        let report = self.build()?;

        let docs_dir = self.config.release_dir.join("jsdoc");
        docgen.generate(&self.config.root, &docs_dir)?;
        Publisher::from_config(&self.config).publish_docs(&docs_dir)?;

        Ok(report)
    }

    /// Shared front half of every build: fresh workspace, resource copy,
    /// module bundle, dependency graph export
    fn prepare_build(&self) -> Result<PipelineReport> {
        let workspace = Workspace::from_config(&self.config);
        workspace.clean()?;
        workspace.prepare()?;

        self.copy_resources()?;

        let bundle = self.bundle_modules()?;

        Ok(PipelineReport {
            bundle,
            ..Default::default()
        })
    }

    /// Copy the project tree into the build workspace
    fn copy_resources(&self) -> Result<()> {
        let mut exclude: Vec<String> = vec![
            // Script sources travel through the bundler, never the copy
            "**/*.js".to_string(),
            "**/*.graphml".to_string(),
            "**/node_modules".to_string(),
            "build.xml".to_string(),
            INSTALL_TEMPLATE.to_string(),
            UPDATE_TEMPLATE.to_string(),
            // Never recurse into our own outputs or the locale drop
            dir_name(&self.config.build_dir),
            dir_name(&self.config.release_dir),
            dir_name(&self.config.locale_dir),
            "**/.git".to_string(),
        ];
        exclude.extend(self.config.exclude.iter().cloned());

        let copied = CopySpec::new(&self.config.root, &self.config.build_dir, &exclude)?.run()?;
        debug!("Resource copy placed {copied} file(s) in the build workspace");

        Ok(())
    }

    /// Bundle the configured entry modules into the build workspace
    fn bundle_modules(&self) -> Result<Option<BundleOutput>> {
        if self.config.entries.is_empty() {
            debug!("No entry modules configured; skipping bundle");
            return Ok(None);
        }

        let mut bundler = Bundler::new(&self.config);
        let output = bundler.bundle(&self.config.build_dir.join("main.js"))?;

        // Diagnostic dependency graph at the invocation root, named after
        // the first entry module
        let graph_name = self
            .config
            .entries
            .first()
            .and_then(|e| e.rsplit('/').next())
            .unwrap_or("main");
        bundler.write_graph(&self.config.root.join(format!("{graph_name}.graphml")))?;

        Ok(Some(output))
    }

    /// Archive the build workspace and (re)write the update descriptor.
    ///
    /// The descriptor always points at the standard artifact; the archiver
    /// may be a no-op, in which case only the descriptor materializes.
    fn create_artifact(&self, filename: &str) -> Result<PathBuf> {
        let output = self.config.release_dir.join(filename);
        self.archiver.archive(&output, &self.config.build_dir)?;

        let subs = self
            .substitutions(&self.config.release)
            .set(LEAF_TOKEN, &self.config.artifact_name(""));
        manifest::stamp(
            &self.config.root.join(UPDATE_TEMPLATE),
            &self.config.release_dir.join("update.rdf"),
            &subs,
        )?;

        Ok(output)
    }

    fn substitutions(&self, release: &str) -> TemplateSubstitution {
        TemplateSubstitution::new()
            .set(VERSION_TOKEN, &self.config.version)
            .set(RELEASE_TOKEN, release)
    }
}

fn dir_name(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::NoopArchiver;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    const INSTALL_TEMPLATE_XML: &str = "\
<?xml version=\"1.0\"?>
<RDF>
  <em:version>@VERSION@@RELEASE@</em:version>
  <em:updateURL>https://example.org/releases/update.rdf</em:updateURL>
</RDF>
";

    const UPDATE_TEMPLATE_XML: &str = "\
<?xml version=\"1.0\"?>
<RDF>
  <em:version>@VERSION@@RELEASE@</em:version>
  <em:updateLink>https://example.org/releases/@LEAF@</em:updateLink>
</RDF>
";

    /// Lay out a minimal extension project in `root`
    fn scaffold(root: &Path) -> Config {
        fs::write(
            root.join("package.json"),
            r#"{ "version": "1.9.0", "name": "inspector",
                 "build": { "entries": ["panel/main"] } }"#,
        )
        .unwrap();
        fs::write(root.join(INSTALL_TEMPLATE), INSTALL_TEMPLATE_XML).unwrap();
        fs::write(root.join(UPDATE_TEMPLATE), UPDATE_TEMPLATE_XML).unwrap();
        fs::write(root.join(LOCALIZED_MANIFEST_TEMPLATE), "locale inspector all\n").unwrap();
        fs::write(root.join("chrome.manifest"), "content inspector content/\n").unwrap();

        let content = root.join("content").join("panel");
        fs::create_dir_all(&content).unwrap();
        fs::write(
            content.join("main.js"),
            "define([], function() { return {}; });",
        )
        .unwrap();

        fs::create_dir_all(root.join("skin")).unwrap();
        fs::write(root.join("skin/panel.css"), "body {}").unwrap();

        Config::load(root.join("package.json")).unwrap()
    }

    /// Test double that snapshots the install manifest at archive time
    struct RecordingArchiver {
        snapshots: Arc<Mutex<Vec<(PathBuf, String)>>>,
    }

    impl Archiver for RecordingArchiver {
        fn archive(&self, output: &Path, source_dir: &Path) -> Result<()> {
            let install = fs::read_to_string(source_dir.join("install.rdf"))?;
            self.snapshots
                .lock()
                .unwrap()
                .push((output.to_path_buf(), install));
            Ok(())
        }
    }

    /// Test double that always fails
    struct FailingArchiver;

    impl Archiver for FailingArchiver {
        fn archive(&self, output: &Path, _source_dir: &Path) -> Result<()> {
            anyhow::bail!("disk full while writing {}", output.display())
        }
    }

    #[test]
    fn test_build_produces_descriptor_and_two_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let config = scaffold(tmp.path());
        let pipeline = Pipeline::new(config, Box::new(NoopArchiver));

        let report = pipeline.build().unwrap();

        assert_eq!(
            report.artifacts,
            vec![
                tmp.path().join("release/inspector-1.9.0.xpi"),
                tmp.path().join("release/inspector-1.9.0-amo.xpi"),
            ]
        );

        let descriptor = fs::read_to_string(tmp.path().join("release/update.rdf")).unwrap();
        assert!(descriptor.contains("<em:version>1.9.0</em:version>"));
        assert!(descriptor.contains("releases/inspector-1.9.0.xpi"));
        assert!(!descriptor.contains('@'));
    }

    #[test]
    fn test_build_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let config = scaffold(tmp.path());
        let pipeline = Pipeline::new(config, Box::new(NoopArchiver));

        pipeline.build().unwrap();
        let first = fs::read_to_string(tmp.path().join("release/update.rdf")).unwrap();

        pipeline.build().unwrap();
        let second = fs::read_to_string(tmp.path().join("release/update.rdf")).unwrap();

        assert_eq!(first, second);

        // Exactly one descriptor in the release dir both times
        let names: Vec<String> = fs::read_dir(tmp.path().join("release"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["update.rdf".to_string()]);
    }

    #[test]
    fn test_restricted_variant_loses_update_url() {
        let tmp = tempfile::tempdir().unwrap();
        let config = scaffold(tmp.path());
        let snapshots = Arc::new(Mutex::new(Vec::new()));
        let archiver = RecordingArchiver {
            snapshots: Arc::clone(&snapshots),
        };
        let pipeline = Pipeline::new(config, Box::new(archiver));

        pipeline.build().unwrap();

        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 2);

        let (standard_path, standard_install) = &snapshots[0];
        let (restricted_path, restricted_install) = &snapshots[1];

        assert!(standard_path.ends_with("inspector-1.9.0.xpi"));
        assert!(standard_install.contains("updateURL"));

        assert!(restricted_path.ends_with("inspector-1.9.0-amo.xpi"));
        assert!(!restricted_install.contains("updateURL"));
    }

    #[test]
    fn test_resource_copy_excludes_scripts_and_templates() {
        let tmp = tempfile::tempdir().unwrap();
        let config = scaffold(tmp.path());
        let pipeline = Pipeline::new(config, Box::new(NoopArchiver));

        pipeline.build().unwrap();
        let build = tmp.path().join("build");

        assert!(build.join("skin/panel.css").is_file());
        assert!(build.join("chrome.manifest").is_file());
        // Scripts travel only through the bundler
        assert!(!build.join("content/panel/main.js").exists());
        assert!(build.join("main.js").is_file());
        // Templates are consumed, not shipped
        assert!(!build.join(INSTALL_TEMPLATE).exists());
        assert!(!build.join(UPDATE_TEMPLATE).exists());
        // Localized manifest template dropped from the standard tree
        assert!(!build.join(LOCALIZED_MANIFEST_TEMPLATE).exists());
        // Stamped install manifest present, restricted by the final strip
        let install = fs::read_to_string(build.join("install.rdf")).unwrap();
        assert!(install.contains("1.9.0"));
    }

    #[test]
    fn test_graph_diagnostic_written_at_root() {
        let tmp = tempfile::tempdir().unwrap();
        let config = scaffold(tmp.path());
        Pipeline::new(config, Box::new(NoopArchiver)).build().unwrap();

        let graphml = fs::read_to_string(tmp.path().join("main.graphml")).unwrap();
        assert!(graphml.contains("<node id=\"panel/main\"/>"));
    }

    #[test]
    fn test_failing_archiver_aborts_the_build() {
        let tmp = tempfile::tempdir().unwrap();
        let config = scaffold(tmp.path());
        let pipeline = Pipeline::new(config, Box::new(FailingArchiver));

        assert!(pipeline.build().is_err());
    }

    #[test]
    fn test_localized_build_merges_locales() {
        let tmp = tempfile::tempdir().unwrap();
        let config = scaffold(tmp.path());

        let locales = tmp.path().join("bz-locale");
        fs::create_dir_all(locales.join("fr-FR")).unwrap();
        fs::create_dir_all(locales.join("en-US")).unwrap();
        fs::write(locales.join("fr-FR/panel.properties"), "k=v").unwrap();
        fs::write(locales.join("en-US/panel.properties"), "k=v").unwrap();

        let pipeline = Pipeline::new(config, Box::new(NoopArchiver));
        let report = pipeline.localized_build().unwrap();

        assert_eq!(
            report.artifacts,
            vec![tmp.path().join("release/inspector-1.9.0-bz.xpi")]
        );

        let build = tmp.path().join("build");
        // Localized chrome manifest promoted over the standard name
        assert_eq!(
            fs::read_to_string(build.join("chrome.manifest")).unwrap(),
            "locale inspector all\n"
        );
        assert!(!build.join(LOCALIZED_MANIFEST_TEMPLATE).exists());
        // Locale drop merged, en-US left to the tree
        assert!(build.join("locale/fr-FR/panel.properties").is_file());
        assert!(!build.join("locale/en-US").exists());
        // Release tag carries the -bz marker
        let install = fs::read_to_string(build.join("install.rdf")).unwrap();
        assert!(install.contains("<em:version>1.9.0-bz</em:version>"));
    }

    #[test]
    fn test_build_without_entries_skips_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        scaffold(tmp.path());
        // Rewrite the descriptor without entry modules
        fs::write(
            tmp.path().join("package.json"),
            r#"{ "version": "1.9.0", "name": "inspector" }"#,
        )
        .unwrap();
        let config = Config::load(tmp.path().join("package.json")).unwrap();

        let report = Pipeline::new(config, Box::new(NoopArchiver)).build().unwrap();
        assert!(report.bundle.is_none());
        assert!(!tmp.path().join("build/main.js").exists());
    }

    #[test]
    fn test_no_writes_outside_workspace_without_deploy() {
        let tmp = tempfile::tempdir().unwrap();
        let config = scaffold(tmp.path());
        let before: Vec<PathBuf> = list_outside(tmp.path());

        Pipeline::new(config, Box::new(NoopArchiver)).build().unwrap();

        let after: Vec<PathBuf> = list_outside(tmp.path());
        // Only the graph diagnostic is new outside build/ and release/
        let new: Vec<_> = after.iter().filter(|p| !before.contains(p)).collect();
        assert_eq!(new, vec![&tmp.path().join("main.graphml")]);
    }

    fn list_outside(root: &Path) -> Vec<PathBuf> {
        fs::read_dir(root)
            .unwrap()
            .map(|e| e.unwrap().path())
            .filter(|p| !p.ends_with("build") && !p.ends_with("release"))
            .collect()
    }
}
