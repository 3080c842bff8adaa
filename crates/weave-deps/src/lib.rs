//! The Dependency Tree: records outer/inner containment and
//! handlee/handler-interface relations between declared classes, and
//! linearizes a query set into a load order where every declared
//! dependency precedes its dependents.
//!
//! Built on `petgraph::graph::DiGraph` for the same "A must be visible
//! before B" shape a namespace-containment graph needs. This layers a
//! deterministic Kahn's-algorithm linearization on top rather than calling
//! `petgraph::algo::toposort` directly, since toposort's order among
//! unconstrained siblings is an implementation detail of its DFS walk, not a
//! guarantee, and a stable order is required here.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use thiserror::Error;
use weave_core::binary_name::outer_of;

/// Why one class must precede another in load order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyEdge {
    /// Source is the outer class of the target.
    OuterContainsInner,
    /// Source is the handler interface a handlee (target) depends on.
    HandleeDependsOnHandler,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("class `{name}` was queried for load order but was never declared")]
    UnknownClass { name: String },
    #[error("cyclic dependency among: {names:?}")]
    Cycle { names: Vec<String> },
}

/// A directed acyclic graph of declared binary names (internal/slash form).
#[derive(Default)]
pub struct DependencyTree {
    graph: DiGraph<String, DependencyEdge>,
    index_of: FxHashMap<String, NodeIndex>,
}

impl DependencyTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn node_index(&mut self, internal_name: &str) -> NodeIndex {
        if let Some(&idx) = self.index_of.get(internal_name) {
            return idx;
        }
        let idx = self.graph.add_node(internal_name.to_string());
        self.index_of.insert(internal_name.to_string(), idx);
        idx
    }

    pub fn is_declared(&self, internal_name: &str) -> bool {
        self.index_of.contains_key(internal_name)
    }

    pub fn declared_classes(&self) -> impl Iterator<Item = &str> {
        self.graph.node_weights().map(String::as_str)
    }

    /// Declare `internal_name`, deriving an outer-before-inner edge from its
    /// `$`-separated name if it has an outer class (§4.3).
    pub fn declare_class(&mut self, internal_name: &str) {
        let inner = self.node_index(internal_name);
        if let Some(outer) = outer_of(internal_name) {
            let outer = self.node_index(outer);
            self.graph.update_edge(outer, inner, DependencyEdge::OuterContainsInner);
        }
    }

    /// Record that `handlee` depends on `handler_interface` (the handler
    /// interface must precede the handlee in load order), declaring either
    /// class if not already declared.
    pub fn declare_handler_dependency(&mut self, handlee: &str, handler_interface: &str) {
        self.declare_class(handlee);
        self.declare_class(handler_interface);
        let handler = self.node_index(handler_interface);
        let handlee_idx = self.node_index(handlee);
        self.graph.update_edge(handler, handlee_idx, DependencyEdge::HandleeDependsOnHandler);
    }

    /// Linearize `query` (or every declared class, if empty) into a stable,
    /// deterministic load order where every outer class precedes its inner
    /// class and every handler interface precedes its dependent handlees.
    pub fn linearize(&self, query: &[String]) -> Result<Vec<String>, DependencyError> {
        let target: BTreeSet<NodeIndex> = if query.is_empty() {
            self.index_of.values().copied().collect()
        } else {
            query
                .iter()
                .map(|name| {
                    self.index_of
                        .get(name)
                        .copied()
                        .ok_or_else(|| DependencyError::UnknownClass { name: name.clone() })
                })
                .collect::<Result<_, _>>()?
        };

        self.kahn_order(&target)
    }

    fn kahn_order(&self, target: &BTreeSet<NodeIndex>) -> Result<Vec<String>, DependencyError> {
        let mut in_degree: FxHashMap<NodeIndex, usize> = FxHashMap::default();
        for &node in target {
            let count = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .filter(|e| target.contains(&e.source()))
                .count();
            in_degree.insert(node, count);
        }

        let mut ready: BTreeSet<(String, NodeIndex)> = target
            .iter()
            .filter(|n| in_degree[n] == 0)
            .map(|&n| (self.graph[n].clone(), n))
            .collect();

        let mut order = Vec::with_capacity(target.len());
        while let Some((name, node)) = ready.pop_first() {
            order.push(name);
            for edge in self.graph.edges_directed(node, Direction::Outgoing) {
                let next = edge.target();
                if !target.contains(&next) {
                    continue;
                }
                let degree = in_degree.get_mut(&next).expect("target node tracked");
                *degree -= 1;
                if *degree == 0 {
                    ready.insert((self.graph[next].clone(), next));
                }
            }
        }

        if order.len() != target.len() {
            let resolved: BTreeSet<&str> = order.iter().map(String::as_str).collect();
            let mut remaining: Vec<String> = target
                .iter()
                .map(|n| self.graph[*n].clone())
                .filter(|name| !resolved.contains(name.as_str()))
                .collect();
            remaining.sort();
            return Err(DependencyError::Cycle { names: remaining });
        }

        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_precedes_inner() {
        let mut tree = DependencyTree::new();
        tree.declare_class("pkg/Outer$Inner");
        let order = tree.linearize(&[]).unwrap();
        let outer_pos = order.iter().position(|n| n == "pkg/Outer").unwrap();
        let inner_pos = order.iter().position(|n| n == "pkg/Outer$Inner").unwrap();
        assert!(outer_pos < inner_pos);
    }

    #[test]
    fn handler_precedes_handlee() {
        let mut tree = DependencyTree::new();
        tree.declare_handler_dependency("pkg/Handlee", "pkg/Handler");
        let order = tree.linearize(&[]).unwrap();
        let handler_pos = order.iter().position(|n| n == "pkg/Handler").unwrap();
        let handlee_pos = order.iter().position(|n| n == "pkg/Handlee").unwrap();
        assert!(handler_pos < handlee_pos);
    }

    #[test]
    fn unconstrained_siblings_break_ties_alphabetically() {
        let mut tree = DependencyTree::new();
        tree.declare_class("pkg/Zebra");
        tree.declare_class("pkg/Apple");
        tree.declare_class("pkg/Mango");
        assert_eq!(
            tree.linearize(&[]).unwrap(),
            vec!["pkg/Apple".to_string(), "pkg/Mango".to_string(), "pkg/Zebra".to_string()]
        );
    }

    #[test]
    fn repeated_linearization_is_identical() {
        let mut tree = DependencyTree::new();
        tree.declare_handler_dependency("pkg/B", "pkg/A");
        tree.declare_class("pkg/C");
        assert_eq!(tree.linearize(&[]).unwrap(), tree.linearize(&[]).unwrap());
    }

    #[test]
    fn query_subset_is_ordered_among_itself() {
        let mut tree = DependencyTree::new();
        tree.declare_handler_dependency("pkg/Handlee", "pkg/Handler");
        tree.declare_class("pkg/Unrelated");
        let order = tree
            .linearize(&["pkg/Handlee".to_string(), "pkg/Handler".to_string()])
            .unwrap();
        assert_eq!(order, vec!["pkg/Handler".to_string(), "pkg/Handlee".to_string()]);
    }

    #[test]
    fn querying_undeclared_class_fails() {
        let tree = DependencyTree::new();
        let err = tree.linearize(&["pkg/Ghost".to_string()]).unwrap_err();
        assert_eq!(err, DependencyError::UnknownClass { name: "pkg/Ghost".to_string() });
    }

    #[test]
    fn cycle_is_reported_with_every_member() {
        let mut tree = DependencyTree::new();
        tree.declare_handler_dependency("pkg/A", "pkg/B");
        tree.declare_handler_dependency("pkg/B", "pkg/A");
        let err = tree.linearize(&[]).unwrap_err();
        assert_eq!(
            err,
            DependencyError::Cycle { names: vec!["pkg/A".to_string(), "pkg/B".to_string()] }
        );
    }
}
