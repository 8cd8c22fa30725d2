//! Echo target: print the effective configuration
//!
//! Diagnostic only; reads the package descriptor and writes nothing.

use anyhow::Result;

use crate::config::Config;

#[derive(Debug, Default)]
pub struct EchoCommand;

impl EchoCommand {
    pub fn execute(&self, config_path: &str) -> Result<()> {
        let config = Config::load(config_path)?;

        println!("Package: {} {}", config.name, config.version_tag());
        println!("Build directory: {}", config.build_dir.display());
        println!("Release directory: {}", config.release_dir.display());
        match &config.deploy_dir {
            Some(dir) => println!(
                "Deploy directory: {} available: {}",
                dir.display(),
                config.deploy_available
            ),
            None => println!("Deploy directory: none"),
        }

        Ok(())
    }
}
