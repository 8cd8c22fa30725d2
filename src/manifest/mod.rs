//! Descriptor stamping
//!
//! Turns templated descriptor files (install manifest, update descriptor)
//! into concrete ones by applying an ordered list of placeholder
//! substitutions. Substitution is total: a placeholder that survives the
//! pass is an error, never silently written out.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Standard placeholder tokens
pub const VERSION_TOKEN: &str = "@VERSION@";
pub const RELEASE_TOKEN: &str = "@RELEASE@";
pub const LEAF_TOKEN: &str = "@LEAF@";

/// Any placeholder-shaped token
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@[A-Z]+@").unwrap());

/// A line carrying the auto-update URL, including its trailing newline
static UPDATE_URL_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^.*updateURL.*\r?\n?").unwrap());

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("unresolved placeholder {token} after substitution")]
    Unresolved { token: String },
}

/// Ordered (placeholder, value) pairs applied in a single pure pass
#[derive(Debug, Clone, Default)]
pub struct TemplateSubstitution {
    pairs: Vec<(String, String)>,
}

impl TemplateSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a substitution pair
    pub fn set(mut self, token: &str, value: &str) -> Self {
        self.pairs.push((token.to_string(), value.to_string()));
        self
    }

    /// Apply every pair to `input`; all occurrences of each placeholder are
    /// replaced. Errors if any placeholder-shaped token remains.
    pub fn apply(&self, input: &str) -> Result<String, TemplateError> {
        let mut output = input.to_string();
        for (token, value) in &self.pairs {
            output = output.replace(token, value);
        }

        if let Some(found) = PLACEHOLDER.find(&output) {
            return Err(TemplateError::Unresolved {
                token: found.as_str().to_string(),
            });
        }

        Ok(output)
    }
}

/// Stamp a descriptor template into a concrete file.
///
/// `dest` may equal `template` to rewrite in place.
pub fn stamp(template: &Path, dest: &Path, subs: &TemplateSubstitution) -> Result<()> {
    let content = fs::read_to_string(template)
        .with_context(|| format!("Failed to read template: {}", template.display()))?;

    let rendered = subs
        .apply(&content)
        .with_context(|| format!("Failed to render template: {}", template.display()))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    fs::write(dest, rendered)
        .with_context(|| format!("Failed to write descriptor: {}", dest.display()))?;

    Ok(())
}

/// Remove the auto-update URL line entirely.
///
/// This is what distinguishes the restricted-distribution descriptor from
/// the standard one: the curated channel carries its own update mechanism.
pub fn strip_update_url(input: &str) -> String {
    UPDATE_URL_LINE.replace_all(input, "").into_owned()
}

/// In-place variant of [`strip_update_url`] for an already-stamped file
pub fn strip_update_url_file(path: &Path) -> Result<()> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read descriptor: {}", path.display()))?;
    fs::write(path, strip_update_url(&content))
        .with_context(|| format!("Failed to write descriptor: {}", path.display()))?;
    Ok(())
}
