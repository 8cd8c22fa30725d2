//! Command-line interface for extbuild
//!
//! A single optional build target selects the pipeline to run:
//! - default: full build (standard + restricted artifacts)
//! - `echo`: print the effective configuration
//! - `jsdoc`: full build plus API doc generation
//! - `bz`: localized build
//! - `help`, anything unrecognized, or extra arguments: usage text

mod build;
mod bz;
mod echo;
mod jsdoc;

use anyhow::Result;
use clap::Parser;

pub use build::BuildCommand;
pub use bz::BzCommand;
pub use echo::EchoCommand;
pub use jsdoc::JsdocCommand;

/// Release packaging tool for browser extensions
#[derive(Parser, Debug)]
#[command(name = "extbuild")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Build target: echo, jsdoc, bz or help (default: full build)
    ///
    /// Hyphenated input that is not a known flag is collected here too,
    /// so it reaches the usage fallback instead of a parse error.
    #[arg(value_name = "TARGET", allow_hyphen_values = true)]
    pub target: Vec<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to the package descriptor
    #[arg(short, long, default_value = "package.json")]
    pub config: String,
}

/// Terminal actions the dispatcher can select
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Build,
    Echo,
    Jsdoc,
    Localized,
    Help,
}

impl Target {
    /// Map raw arguments to a target. Anything unrecognized, including more
    /// than one argument, falls back to the usage text.
    pub fn from_args(args: &[String]) -> Self {
        match args {
            [] => Target::Build,
            [one] => match one.as_str() {
                "echo" => Target::Echo,
                "jsdoc" => Target::Jsdoc,
                "bz" => Target::Localized,
                _ => Target::Help,
            },
            _ => Target::Help,
        }
    }
}

impl Cli {
    /// Execute the selected target
    pub fn execute(&self) -> Result<()> {
        match Target::from_args(&self.target) {
            Target::Build => BuildCommand.execute(&self.config),
            Target::Echo => EchoCommand.execute(&self.config),
            Target::Jsdoc => JsdocCommand.execute(&self.config),
            Target::Localized => BzCommand.execute(&self.config),
            Target::Help => {
                print_usage();
                Ok(())
            }
        }
    }
}

/// Print the usage text. Unrecognized input lands here too, as a clean
/// exit rather than a failure.
pub fn print_usage() {
    println!("Usage:");
    println!();
    println!("1. To build the extension archives run:");
    println!("       $ extbuild");
    println!("   The release directory will contain two archives plus update.rdf:");
    println!("   - <name>-<version>.xpi (with update URL) for the main site");
    println!("   - <name>-<version>-amo.xpi (update disabled) for the curated channel");
    println!();
    println!("   If a deployment directory is configured in package.json and exists");
    println!("   on disk, the artifacts are also copied there.");
    println!();
    println!("2. To check the effective configuration run:");
    println!("       $ extbuild echo");
    println!();
    println!("3. To build the archives and generate API docs run:");
    println!("       $ extbuild jsdoc");
    println!();
    println!("4. To build the localized archive run:");
    println!("       $ extbuild bz");
    println!("   All extra locales should be stored in the 'bz-locale' directory.");
}
