//! extbuild - release packaging for browser extensions
//!
//! Sequences the packaging pipeline: clean the workspace, copy and filter
//! the resource tree, bundle module sources, stamp descriptor templates and
//! hand the result to an archiver.
//!
//! # Targets
//! - default: full build (standard + restricted-distribution artifacts)
//! - `echo`: print the effective configuration
//! - `jsdoc`: full build plus API doc generation
//! - `bz`: localized build from the locale drop directory

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use extbuild::Cli;

/// Initialize the logging/tracing system
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("extbuild=debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("extbuild=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    cli.execute()
}
