//! Module resolution
//!
//! Extracts declared dependencies from module sources and resolves module
//! names to files under the configured module roots.

use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::utils::clean_path;

/// Dependency array of an AMD-style `define([...])` header
static DEFINE_DEPS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"define\s*\(\s*\[([^\]]*)\]").unwrap());

/// String literals inside a dependency array
static DEP_LITERAL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["']([^"']+)["']"#).unwrap());

/// Synchronous `require("...")` calls
static REQUIRE_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"require\s*\(\s*["']([^"']+)["']\s*\)"#).unwrap());

/// Extract direct dependency names from module source, in declaration order
pub fn extract_dependencies(source: &str) -> Vec<String> {
    let mut dependencies = Vec::new();

    if let Some(cap) = DEFINE_DEPS.captures(source) {
        for literal in DEP_LITERAL.captures_iter(&cap[1]) {
            let dep = literal[1].to_string();
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }
    }

    for cap in REQUIRE_CALL.captures_iter(source) {
        let dep = cap[1].to_string();
        if !dependencies.contains(&dep) {
            dependencies.push(dep);
        }
    }

    debug!("Found {} dependencies", dependencies.len());

    dependencies
}

/// Normalize a dependency name against its importer.
///
/// Names are root-relative by default; `./` and `../` names resolve against
/// the importer's directory.
pub fn normalize(name: &str, importer: &str) -> String {
    if !name.starts_with('.') {
        return name.to_string();
    }

    let base = match importer.rsplit_once('/') {
        Some((dir, _)) => dir,
        None => "",
    };

    if base.is_empty() {
        clean_path(name)
    } else {
        clean_path(&format!("{base}/{name}"))
    }
}

/// Resolve a module name to a source file by probing each module root
pub fn resolve(name: &str, roots: &[PathBuf]) -> Option<PathBuf> {
    for root in roots {
        let candidate = root.join(format!("{name}.js"));
        if candidate.is_file() {
            return Some(candidate);
        }
    }

    debug!("No source found for module '{name}'");
    None
}

/// Module name for a source file: path relative to its root, extension
/// stripped
pub fn module_name(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let name = relative.with_extension("");
    Some(name.to_string_lossy().replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_define_dependencies() {
        let source = r#"
            define(["panel/toolbar", "lib/string", 'lib/dom'],
            function(Toolbar, Str, Dom) {
                return {};
            });
        "#;

        let deps = extract_dependencies(source);
        assert_eq!(deps, vec!["panel/toolbar", "lib/string", "lib/dom"]);
    }

    #[test]
    fn test_extract_require_calls() {
        let source = r#"
            var str = require("lib/string");
            var dom = require('lib/dom');
            var str2 = require("lib/string");
        "#;

        let deps = extract_dependencies(source);
        assert_eq!(deps, vec!["lib/string", "lib/dom"]);
    }

    #[test]
    fn test_extract_without_dependencies() {
        assert!(extract_dependencies("var x = 1;").is_empty());
        assert!(extract_dependencies("define([], function() {});").is_empty());
    }

    #[test]
    fn test_normalize_relative_names() {
        assert_eq!(normalize("lib/string", "panel/main"), "lib/string");
        assert_eq!(normalize("./toolbar", "panel/main"), "panel/toolbar");
        assert_eq!(normalize("../lib/dom", "panel/main"), "lib/dom");
        assert_eq!(normalize("./util", "main"), "util");
    }

    #[test]
    fn test_resolve_probes_roots_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let first = tmp.path().join("content");
        let second = tmp.path().join("extra");
        std::fs::create_dir_all(first.join("lib")).unwrap();
        std::fs::create_dir_all(&second).unwrap();
        std::fs::write(first.join("lib/string.js"), "define([], function(){});").unwrap();
        std::fs::write(second.join("other.js"), "define([], function(){});").unwrap();

        let roots = vec![first.clone(), second.clone()];
        assert_eq!(
            resolve("lib/string", &roots),
            Some(first.join("lib/string.js"))
        );
        assert_eq!(resolve("other", &roots), Some(second.join("other.js")));
        assert_eq!(resolve("missing", &roots), None);
    }

    #[test]
    fn test_module_name_strips_extension() {
        let root = Path::new("/project/content");
        let path = Path::new("/project/content/panel/main.js");
        assert_eq!(module_name(path, root), Some("panel/main".to_string()));
    }
}
