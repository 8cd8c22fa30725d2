//! Archive creation seam
//!
//! The pipeline only needs one capability: compress a directory tree into a
//! single archive file. The real compressor is an external collaborator, so
//! it sits behind a trait; the default implementation records the gap and
//! lets packaging finish without it.

use std::path::Path;

use anyhow::Result;
use tracing::warn;

/// Compresses a directory tree into a single archive file
pub trait Archiver {
    fn archive(&self, output: &Path, source_dir: &Path) -> Result<()>;
}

/// Stand-in used until a real compressor is wired up
#[derive(Debug, Default)]
pub struct NoopArchiver;

impl Archiver for NoopArchiver {
    fn archive(&self, output: &Path, _source_dir: &Path) -> Result<()> {
        warn!("Archiver not implemented; skipping {}", output.display());
        Ok(())
    }
}
