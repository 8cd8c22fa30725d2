//! Default build target

use std::time::Instant;

use anyhow::Result;
use colored::Colorize;
use tracing::info;

use crate::archive::NoopArchiver;
use crate::config::Config;
use crate::pipeline::Pipeline;
use crate::utils::{format_duration, format_size};

/// Full build: standard and restricted-distribution artifacts
#[derive(Debug, Default)]
pub struct BuildCommand;

impl BuildCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        let start = Instant::now();

        info!("Loading package descriptor from {}", config_path);
        let config = Config::load(config_path)?;

        eprintln!(
            "{} Packaging {} {}...",
            "→".blue(),
            config.name.bold(),
            config.version_tag()
        );

        let pipeline = Pipeline::new(config, Box::new(NoopArchiver));
        let report = pipeline.build()?;

        eprintln!(
            "\n{} Packaged {} artifact(s) in {}\n",
            "✓".green().bold(),
            report.artifacts.len(),
            format_duration(start.elapsed())
        );

        if let Some(bundle) = &report.bundle {
            eprintln!(
                "  {} {} {} ({} modules)",
                "•".dimmed(),
                bundle.path.display().to_string().cyan(),
                format_size(bundle.size).dimmed(),
                bundle.modules
            );
        }
        for artifact in &report.artifacts {
            eprintln!(
                "  {} {}",
                "•".dimmed(),
                artifact.display().to_string().cyan()
            );
        }
        eprintln!();

        Ok(())
    }
}
