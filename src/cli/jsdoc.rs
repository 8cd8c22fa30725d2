//! Jsdoc target: full build plus API doc generation and doc deployment

use anyhow::Result;
use colored::Colorize;
use tracing::info;

use crate::archive::NoopArchiver;
use crate::config::Config;
use crate::docgen::NoopDocGenerator;
use crate::pipeline::Pipeline;

#[derive(Debug, Default)]
pub struct JsdocCommand;

impl JsdocCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        info!("Loading package descriptor from {}", config_path);
        let config = Config::load(config_path)?;

        eprintln!(
            "{} Packaging {} {} with API docs...",
            "→".blue(),
            config.name.bold(),
            config.version_tag()
        );

        let pipeline = Pipeline::new(config, Box::new(NoopArchiver));
        pipeline.build_with_docs(&NoopDocGenerator)?;

        eprintln!("{} Done\n", "✓".green().bold());

        Ok(())
    }
}
