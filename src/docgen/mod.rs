//! API documentation generation seam
//!
//! Doc generation is delegated to an external toolkit; the pipeline only
//! knows the `generate(source_root, output_dir)` shape.

use std::path::Path;

use anyhow::Result;
use tracing::warn;

/// Generates API documentation from source comments
pub trait DocGenerator {
    fn generate(&self, source_root: &Path, output_dir: &Path) -> Result<()>;
}

/// Stand-in used until a real generator is wired up
#[derive(Debug, Default)]
pub struct NoopDocGenerator;

impl DocGenerator for NoopDocGenerator {
    fn generate(&self, _source_root: &Path, output_dir: &Path) -> Result<()> {
        warn!(
            "Doc generator not implemented; skipping {}",
            output_dir.display()
        );
        Ok(())
    }
}
