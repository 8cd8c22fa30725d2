//! extbuild library
//!
//! Core functionality for the extbuild packaging tool.

pub mod archive;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod copier;
pub mod deploy;
pub mod docgen;
pub mod manifest;
pub mod pipeline;
pub mod utils;
pub mod workspace;

pub use cli::Cli;
pub use config::Config;
pub use pipeline::Pipeline;
