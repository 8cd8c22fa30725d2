//! Bz target: localized build from the locale drop directory

use anyhow::Result;
use colored::Colorize;
use tracing::info;

use crate::archive::NoopArchiver;
use crate::config::Config;
use crate::pipeline::Pipeline;

#[derive(Debug, Default)]
pub struct BzCommand;

impl BzCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading package descriptor from {}", config_path);
        let config = Config::load(config_path)?;

        eprintln!(
            "{} Packaging localized {} {}-bz...",
            "→".blue(),
            config.name.bold(),
            config.version_tag()
        );

        let pipeline = Pipeline::new(config, Box::new(NoopArchiver));
        let report = pipeline.localized_build()?;

        eprintln!(
            "{} Packaged {} artifact(s)\n",
            "✓".green().bold(),
            report.artifacts.len()
        );

        Ok(())
    }
}
