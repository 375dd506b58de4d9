//! Project-wide inheritance depth analysis.
//!
//! Two-pass: each file contributes class → declared-parent-name edges,
//! the merged graph is resolved once at the end of the scan. Resolution
//! is memoized and order-independent, so a subclass defined before (or in
//! a different file than) its base resolves to the same depth either
//! way. Parents that never appear as a class in the scanned project
//! contribute a depth of 1, and cycles resolve their back-edge
//! participant as depth 1 rather than recursing forever.

use crate::utils::dotted_name;
use ruff_python_ast::{self as ast, Expr, Stmt};
use rustc_hash::{FxHashMap, FxHashSet};

/// Class name → declared parent names, accumulated across all files of
/// one scan. Transient: used only to compute `max_inheritance_depth`.
#[derive(Debug, Default)]
pub struct ClassGraph {
    edges: FxHashMap<String, Vec<String>>,
}

impl ClassGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every class definition in `body`, recursing into nested
    /// scopes (methods defining classes, conditionally defined classes).
    pub fn collect(&mut self, body: &[Stmt]) {
        for stmt in body {
            self.collect_stmt(stmt);
        }
    }

    /// Merges edges collected from another file's shard.
    /// First definition of a class name wins, mirroring Python's view of
    /// a project-unique class name.
    pub fn merge(&mut self, other: Self) {
        for (class, parents) in other.edges {
            self.edges.entry(class).or_insert(parents);
        }
    }

    /// Number of distinct classes seen.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.edges.len()
    }

    /// Resolves every class to its inheritance depth.
    ///
    /// depth(class) = 1 + max(depth of each parent), where a parent with
    /// no definition in the graph counts as depth 1.
    #[must_use]
    pub fn resolve_depths(&self) -> FxHashMap<String, usize> {
        let mut depths = FxHashMap::default();
        for class in self.edges.keys() {
            let mut in_progress = FxHashSet::default();
            self.depth_of(class, &mut depths, &mut in_progress);
        }
        depths
    }

    /// The deepest chain in the graph; 0 when no classes were seen.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.resolve_depths().values().copied().max().unwrap_or(0)
    }

    fn depth_of(
        &self,
        class: &str,
        depths: &mut FxHashMap<String, usize>,
        in_progress: &mut FxHashSet<String>,
    ) -> usize {
        if let Some(depth) = depths.get(class) {
            return *depth;
        }
        let Some(parents) = self.edges.get(class) else {
            // External or undefined parent
            return 1;
        };
        if !in_progress.insert(class.to_owned()) {
            // Cycle: treat the back edge as an external base
            return 1;
        }
        let parent_max = parents
            .iter()
            .map(|p| self.depth_of(p, depths, in_progress))
            .max()
            .unwrap_or(0);
        in_progress.remove(class);
        let depth = 1 + parent_max;
        depths.insert(class.to_owned(), depth);
        depth
    }

    fn collect_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::ClassDef(node) => {
                let parents = node
                    .arguments
                    .as_deref()
                    .map(|args| {
                        args.args
                            .iter()
                            .filter_map(parent_name)
                            .collect::<Vec<_>>()
                    })
                    .unwrap_or_default();
                self.edges
                    .entry(node.name.to_string())
                    .or_insert(parents);
                self.collect(&node.body);
            }
            Stmt::FunctionDef(node) => self.collect(&node.body),
            Stmt::If(node) => {
                self.collect(&node.body);
                for clause in &node.elif_else_clauses {
                    self.collect(&clause.body);
                }
            }
            Stmt::Try(node) => {
                self.collect(&node.body);
                for handler in &node.handlers {
                    let ast::ExceptHandler::ExceptHandler(h) = handler;
                    self.collect(&h.body);
                }
                self.collect(&node.orelse);
                self.collect(&node.finalbody);
            }
            Stmt::With(node) => self.collect(&node.body),
            _ => {}
        }
    }
}

/// A base class reference resolves to its final name segment:
/// `models.Model` inherits from `Model`.
fn parent_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Name(node) => Some(node.id.to_string()),
        Expr::Attribute(node) => Some(node.attr.to_string()),
        // Generic bases like Protocol[T] resolve through the subscripted value
        Expr::Subscript(node) => dotted_name(&node.value)
            .map(|name| name.rsplit('.').next().unwrap_or(&name).to_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::parse_python;

    fn graph_of(sources: &[&str]) -> ClassGraph {
        let mut graph = ClassGraph::new();
        for source in sources {
            let module = parse_python(source).unwrap();
            graph.collect(&module.body);
        }
        graph
    }

    #[test]
    fn single_parent_chain() {
        let graph = graph_of(&["class A:\n    pass\n\nclass B(A):\n    pass\n"]);
        let depths = graph.resolve_depths();
        assert_eq!(depths["A"], 1);
        assert_eq!(depths["B"], 2);
    }

    #[test]
    fn five_level_chain_has_depth_five() {
        let graph = graph_of(&[
            "class A: pass\nclass B(A): pass\nclass C(B): pass\nclass D(C): pass\nclass E(D): pass\n",
        ]);
        assert_eq!(graph.max_depth(), 5);
    }

    #[test]
    fn forward_reference_resolves_the_same() {
        // Subclass textually before its base
        let graph = graph_of(&["class B(A): pass\nclass A: pass\n"]);
        let depths = graph.resolve_depths();
        assert_eq!(depths["B"], 2);
    }

    #[test]
    fn base_in_another_file_resolves() {
        let graph = graph_of(&["class Child(Base): pass\n", "class Base: pass\n"]);
        assert_eq!(graph.resolve_depths()["Child"], 2);
    }

    #[test]
    fn external_parent_counts_as_one() {
        let graph = graph_of(&["class M(models.Model): pass\n"]);
        assert_eq!(graph.resolve_depths()["M"], 2);
    }

    #[test]
    fn cycle_does_not_recurse_forever() {
        let graph = graph_of(&["class A(B): pass\nclass B(A): pass\n"]);
        let depths = graph.resolve_depths();
        assert!(depths["A"] >= 1 && depths["A"] <= 2);
        assert!(depths["B"] >= 1 && depths["B"] <= 2);
    }

    #[test]
    fn diverging_multiple_inheritance_takes_max() {
        let graph = graph_of(&[
            "class A: pass\nclass B(A): pass\nclass C(B): pass\nclass D(A, C): pass\n",
        ]);
        assert_eq!(graph.resolve_depths()["D"], 4);
    }

    #[test]
    fn empty_graph_has_depth_zero() {
        let graph = graph_of(&["x = 1\n"]);
        assert_eq!(graph.max_depth(), 0);
        assert_eq!(graph.class_count(), 0);
    }
}
