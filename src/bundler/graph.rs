//! Module graph data structures

use std::collections::HashMap;
use std::path::PathBuf;

/// Unique identifier for a module within the graph
pub type ModuleId = usize;

/// A module in the dependency graph
#[derive(Debug, Clone)]
pub struct Module {
    /// Module name: path relative to a module root, extension stripped
    pub name: String,

    /// Source file on disk; `None` for synthesized sources (e.g. the
    /// loader prelude), which are emitted without annotation
    pub path: Option<PathBuf>,

    /// Original source code
    pub source: String,

    /// Whether this is an entry point
    pub is_entry: bool,

    /// Dependency names declared by this module, in declaration order
    pub dependencies: Vec<String>,
}

/// The module dependency graph
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// All modules indexed by their ID
    modules: HashMap<ModuleId, Module>,

    /// Map from module name to module ID
    name_to_id: HashMap<String, ModuleId>,

    /// Dependency edges, in declaration order
    edges: HashMap<ModuleId, Vec<ModuleId>>,

    /// Next available module ID
    next_id: ModuleId,
}

impl ModuleGraph {
    /// Create a new empty module graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module to the graph; re-adding a known name returns its ID
    pub fn add_module(&mut self, module: Module) -> ModuleId {
        if let Some(&id) = self.name_to_id.get(&module.name) {
            return id;
        }

        let id = self.next_id;
        self.next_id += 1;

        self.name_to_id.insert(module.name.clone(), id);
        self.modules.insert(id, module);
        self.edges.insert(id, Vec::new());

        id
    }

    /// Add a dependency edge between modules
    pub fn add_dependency(&mut self, from: ModuleId, to: ModuleId) {
        if let Some(deps) = self.edges.get_mut(&from) {
            if !deps.contains(&to) {
                deps.push(to);
            }
        }
    }

    /// Get module ID by name
    pub fn get_module_id(&self, name: &str) -> Option<ModuleId> {
        self.name_to_id.get(name).copied()
    }

    /// Get a module by ID
    pub fn get_module(&self, id: ModuleId) -> Option<&Module> {
        self.modules.get(&id)
    }

    /// Direct dependencies of a module, in declaration order
    pub fn get_dependencies(&self, id: ModuleId) -> Vec<ModuleId> {
        self.edges.get(&id).cloned().unwrap_or_default()
    }

    /// Dependency closure of the given entries: depth-first, dependencies
    /// before dependents, each module visited once
    pub fn closure(&self, entries: &[ModuleId]) -> Vec<ModuleId> {
        let mut visited = vec![false; self.next_id];
        let mut order = Vec::new();

        for &entry in entries {
            self.visit(entry, &mut visited, &mut order);
        }

        order
    }

    fn visit(&self, id: ModuleId, visited: &mut Vec<bool>, order: &mut Vec<ModuleId>) {
        if id >= visited.len() || visited[id] {
            return;
        }
        visited[id] = true;

        for dep in self.get_dependencies(id) {
            self.visit(dep, visited, order);
        }

        order.push(id);
    }

    /// Total number of modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if graph is empty
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Render the graph as GraphML for external visualization.
    ///
    /// Diagnostic output only: a faithful node and edge list, nothing more.
    pub fn to_graphml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");
        out.push_str("  <graph id=\"dependencies\" edgedefault=\"directed\">\n");

        let mut ids: Vec<ModuleId> = self.modules.keys().copied().collect();
        ids.sort_unstable();

        for id in &ids {
            if let Some(module) = self.modules.get(id) {
                out.push_str(&format!(
                    "    <node id=\"{}\"/>\n",
                    xml_escape(&module.name)
                ));
            }
        }

        for id in &ids {
            let from = match self.modules.get(id) {
                Some(m) => &m.name,
                None => continue,
            };
            for dep in self.get_dependencies(*id) {
                if let Some(to) = self.modules.get(&dep) {
                    out.push_str(&format!(
                        "    <edge source=\"{}\" target=\"{}\"/>\n",
                        xml_escape(from),
                        xml_escape(&to.name)
                    ));
                }
            }
        }

        out.push_str("  </graph>\n");
        out.push_str("</graphml>\n");
        out
    }
}

fn xml_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(name: &str) -> Module {
        Module {
            name: name.to_string(),
            path: Some(PathBuf::from(format!("/src/{name}.js"))),
            source: String::new(),
            is_entry: false,
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn test_add_module_is_idempotent_per_name() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(module("panel/main"));
        let again = graph.add_module(module("panel/main"));

        assert_eq!(a, again);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get_module_id("panel/main"), Some(a));
    }

    #[test]
    fn test_closure_orders_dependencies_first() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(module("a"));
        let b = graph.add_module(module("b"));
        let c = graph.add_module(module("c"));

        // a -> b -> c
        graph.add_dependency(a, b);
        graph.add_dependency(b, c);

        assert_eq!(graph.closure(&[a]), vec![c, b, a]);
    }

    #[test]
    fn test_closure_visits_diamond_once() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(module("a"));
        let b = graph.add_module(module("b"));
        let c = graph.add_module(module("c"));
        let d = graph.add_module(module("d"));

        // a -> b -> d, a -> c -> d
        graph.add_dependency(a, b);
        graph.add_dependency(a, c);
        graph.add_dependency(b, d);
        graph.add_dependency(c, d);

        let order = graph.closure(&[a]);
        assert_eq!(order, vec![d, b, c, a]);
    }

    #[test]
    fn test_duplicate_edges_collapse() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(module("a"));
        let b = graph.add_module(module("b"));

        graph.add_dependency(a, b);
        graph.add_dependency(a, b);

        assert_eq!(graph.get_dependencies(a), vec![b]);
    }

    #[test]
    fn test_graphml_lists_every_edge() {
        let mut graph = ModuleGraph::new();
        let a = graph.add_module(module("panel/main"));
        let b = graph.add_module(module("lib/string"));
        graph.add_dependency(a, b);

        let graphml = graph.to_graphml();
        assert!(graphml.contains("<node id=\"panel/main\"/>"));
        assert!(graphml.contains("<node id=\"lib/string\"/>"));
        assert!(graphml.contains("<edge source=\"panel/main\" target=\"lib/string\"/>"));
    }
}
