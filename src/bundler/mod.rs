//! Module bundler
//!
//! Resolves the dependency closure of the configured entry modules and
//! concatenates them into a single bundle file. Each module body is wrapped
//! in a `define` block annotated with the module's name and its direct
//! dependencies; a minimal loader prelude goes first.

mod graph;
pub mod resolver;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

use crate::config::Config;

pub use graph::{Module, ModuleGraph, ModuleId};

/// AMD header including its dependency array, whitespace-tolerant like the
/// extraction patterns in [`resolver`]
static DEFINE_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"define\s*\(\s*\[[^\]]*\]").unwrap());

/// Any `define(` call, with or without a dependency array
static DEFINE_CALL: Lazy<Regex> = Lazy::new(|| Regex::new(r"define\s*\(").unwrap());

/// Minimal AMD-style loader shipped at the top of every bundle.
///
/// The dependency names "require", "exports" and "module" are the usual
/// CommonJS-wrapper magic values; everything else resolves by exact name,
/// so emitted dependency arrays must carry the registered module names.
const LOADER_PRELUDE: &str = r#"(function() {
  var defined = {};
  var exported = {};

  function define(name, deps, factory) {
    defined[name] = { deps: deps, factory: factory };
  }

  function require(name) {
    if (exported.hasOwnProperty(name)) {
      return exported[name];
    }
    var entry = defined[name];
    if (!entry) {
      throw new Error("Module not defined: " + name);
    }
    var module = { exports: {} };
    exported[name] = module.exports;
    var args = entry.deps.map(function(dep) {
      if (dep === "require") return require;
      if (dep === "exports") return module.exports;
      if (dep === "module") return module;
      return require(dep);
    });
    var result = entry.factory.apply(null, args);
    if (result !== undefined) {
      module.exports = result;
      exported[name] = result;
    }
    return exported[name];
  }

  this.define = define;
  this.require = require;
})();
"#;

/// Summary of an emitted bundle
#[derive(Debug)]
pub struct BundleOutput {
    /// Output file path
    pub path: PathBuf,

    /// Bundle size in bytes
    pub size: usize,

    /// Number of modules in the closure (prelude excluded)
    pub modules: usize,
}

/// The module bundler
pub struct Bundler {
    module_roots: Vec<PathBuf>,
    entries: Vec<String>,
    graph: ModuleGraph,
}

impl Bundler {
    /// Create a bundler from the project configuration
    pub fn new(config: &Config) -> Self {
        Self {
            module_roots: config.module_roots.clone(),
            entries: config.entries.clone(),
            graph: ModuleGraph::new(),
        }
    }

    /// Resolve the entry closure and write the bundle to `output`
    pub fn bundle(&mut self, output: &Path) -> Result<BundleOutput> {
        let mut entry_ids = Vec::new();
        for entry in self.entries.clone() {
            match self.load_module(&entry, true)? {
                Some(id) => entry_ids.push(id),
                None => anyhow::bail!("Entry module not found: {entry}"),
            }
        }

        let order = self.graph.closure(&entry_ids);

        let mut bundle = String::new();

        // The prelude is a synthesized, path-less source; it is emitted
        // verbatim, without a define annotation
        let prelude = Module {
            name: "require".to_string(),
            path: None,
            source: LOADER_PRELUDE.to_string(),
            is_entry: false,
            dependencies: Vec::new(),
        };
        bundle.push_str(&wrap_module(&prelude));

        for &id in &order {
            if let Some(module) = self.graph.get_module(id) {
                bundle.push_str(&wrap_module(module));
            }
        }

        // Entry modules kick off execution at the end of the file
        for &id in &entry_ids {
            if let Some(module) = self.graph.get_module(id) {
                bundle.push_str(&format!("\nrequire(\"{}\");\n", module.name));
            }
        }

        if let Some(parent) = output.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        fs::write(output, &bundle)
            .with_context(|| format!("Failed to write bundle: {}", output.display()))?;

        debug!("Bundled {} module(s) into {}", order.len(), output.display());

        Ok(BundleOutput {
            path: output.to_path_buf(),
            size: bundle.len(),
            modules: order.len(),
        })
    }

    /// Write the resolved dependency graph as GraphML
    pub fn write_graph(&self, output: &Path) -> Result<()> {
        fs::write(output, self.graph.to_graphml())
            .with_context(|| format!("Failed to write graph: {}", output.display()))?;
        Ok(())
    }

    /// Load a module and, depth-first, everything it depends on.
    ///
    /// `Ok(None)` means no source file exists for `name`; the caller decides
    /// whether that is fatal (entries) or skippable (dependencies). A file
    /// that exists but cannot be read is an I/O error, not a missing module.
    fn load_module(&mut self, name: &str, is_entry: bool) -> Result<Option<ModuleId>> {
        if let Some(id) = self.graph.get_module_id(name) {
            return Ok(Some(id));
        }

        let Some(path) = resolver::resolve(name, &self.module_roots) else {
            return Ok(None);
        };
        let source = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read module: {}", path.display()))?;

        let dependencies: Vec<String> = resolver::extract_dependencies(&source)
            .iter()
            .map(|dep| resolver::normalize(dep, name))
            .collect();

        let id = self.graph.add_module(Module {
            name: name.to_string(),
            path: Some(path),
            source,
            is_entry,
            dependencies: dependencies.clone(),
        });

        for dep in &dependencies {
            match self.load_module(dep, false)? {
                Some(dep_id) => self.graph.add_dependency(id, dep_id),
                // Unknown source is a capability gap, not a build failure
                None => warn!("Skipping unresolved dependency '{dep}' of '{name}'"),
            }
        }

        Ok(Some(id))
    }
}

/// Wrap a module body in an annotated define block.
///
/// Sources that already carry an AMD header get the module name spliced in;
/// bare sources are wrapped whole. A module without a known source path is
/// emitted untouched, with a diagnostic.
fn wrap_module(module: &Module) -> String {
    if module.path.is_none() {
        warn!(
            "Module '{}' has no source path; emitting without a define wrapper",
            module.name
        );
        return format!("\n// Module: {}\n{}", module.name, module.source);
    }

    let deps = module
        .dependencies
        .iter()
        .map(|d| format!("\"{d}\""))
        .collect::<Vec<_>>()
        .join(", ");

    // Replace the whole header, dependency array included, so the emitted
    // array carries the normalized names registered with the loader rather
    // than the raw (possibly relative) ids from the source.
    if let Some(header) = DEFINE_HEADER.find(&module.source) {
        return format!(
            "\n// Module: {}\n{}define(\"{}\", [{}]{}",
            module.name,
            &module.source[..header.start()],
            module.name,
            deps,
            &module.source[header.end()..]
        );
    }

    if DEFINE_CALL.is_match(&module.source) {
        warn!(
            "Module '{}' calls define without a dependency array; emitting unannotated",
            module.name
        );
        return format!("\n// Module: {}\n{}", module.name, module.source);
    }

    let magic = if deps.is_empty() {
        "\"require\", \"exports\", \"module\"".to_string()
    } else {
        format!("\"require\", \"exports\", \"module\", {deps}")
    };

    format!(
        "\n// Module: {}\ndefine(\"{}\", [{}], function(require, exports, module) {{\n{}\n}});\n",
        module.name, module.name, magic, module.source
    )
}
