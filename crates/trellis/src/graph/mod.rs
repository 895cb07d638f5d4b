//! Dependency graph integrity engine.
//!
//! This module owns the set of directed "depends on" edges between
//! initiatives and guards its two invariants:
//!
//! - the edge set is acyclic, at all times
//! - no initiative depends on itself
//!
//! Every mutating operation either fully succeeds preserving acyclicity or
//! fully fails leaving the edge set untouched.
//!
//! # Graph Representation and Edge Direction Convention
//!
//! Edges point from **dependent -> dependency**: the source initiative
//! depends on the target initiative. Initiatives are stored elsewhere and
//! referenced by identifier only, so the graph never creates ownership
//! cycles.
//!
//! # Blocking Semantics
//!
//! An initiative is **blocked** when at least one of its *direct*
//! dependencies has a status other than [`InitiativeStatus::Done`]. The
//! blocked state is a pure function of the edge set and the dependencies'
//! current statuses; it is computed on demand and never stored. Note the
//! deliberate asymmetry: blocking looks one hop out, while cycle detection
//! walks the transitive dependent graph.

use crate::domain::{DependencyEdge, Initiative, InitiativeId, InitiativeStatus};
use crate::error::{Error, Result};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use std::collections::{HashMap, HashSet, VecDeque};

/// The directed, always-acyclic "depends on" graph over initiative
/// identifiers.
///
/// Nodes carry [`InitiativeId`] values; edges carry no weight. A
/// `HashMap` keeps identifier-to-node lookups O(1).
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Edge direction: source (dependent) -> target (dependency).
    graph: DiGraph<InitiativeId, ()>,

    /// Mapping from `InitiativeId` to graph `NodeIndex`.
    node_map: HashMap<InitiativeId, NodeIndex>,
}

impl DependencyGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an initiative as a node, returning its index.
    ///
    /// A no-op when the initiative is already present.
    pub fn insert_node(&mut self, id: &InitiativeId) -> NodeIndex {
        if let Some(&node) = self.node_map.get(id) {
            return node;
        }
        let node = self.graph.add_node(id.clone());
        self.node_map.insert(id.clone(), node);
        node
    }

    /// Remove an initiative and every edge touching it.
    ///
    /// A no-op when the initiative is unknown.
    pub fn remove_node(&mut self, id: &InitiativeId) {
        let Some(node) = self.node_map.remove(id) else {
            return;
        };
        self.graph.remove_node(node);
        // petgraph moves the highest-index node into the freed slot, so the
        // swapped node's map entry must be refreshed.
        if let Some(swapped) = self.graph.node_weight(node) {
            self.node_map.insert(swapped.clone(), node);
        }
    }

    /// Whether the initiative is registered as a node.
    #[must_use]
    pub fn contains(&self, id: &InitiativeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Whether the exact edge `from -> to` exists.
    #[must_use]
    pub fn contains_edge(&self, from: &InitiativeId, to: &InitiativeId) -> bool {
        match (self.node_map.get(from), self.node_map.get(to)) {
            (Some(&a), Some(&b)) => self.graph.find_edge(a, b).is_some(),
            _ => false,
        }
    }

    /// Number of registered initiatives.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Export the current edge set as identifier pairs.
    ///
    /// This is the form hosts persist and later feed back through graph
    /// initialization.
    #[must_use]
    pub fn edges(&self) -> Vec<DependencyEdge> {
        self.graph
            .edge_references()
            .map(|edge| DependencyEdge {
                initiative_id: self.graph[edge.source()].clone(),
                dependency_id: self.graph[edge.target()].clone(),
            })
            .collect()
    }

    /// Record that `from` depends on `to`.
    ///
    /// Unknown identifiers are registered as nodes; the caller is expected
    /// to have validated that they reference real initiatives.
    ///
    /// # Errors
    ///
    /// - [`Error::SelfDependency`] when `from == to`
    /// - [`Error::DuplicateDependency`] when the exact edge already exists
    /// - [`Error::CircularDependency`] when the edge would close a cycle
    ///
    /// The edge set is unchanged on every failure path.
    pub fn add_dependency(&mut self, from: &InitiativeId, to: &InitiativeId) -> Result<()> {
        if from == to {
            return Err(Error::SelfDependency { id: from.clone() });
        }

        let from_node = self.insert_node(from);
        let to_node = self.insert_node(to);

        if self.graph.find_edge(from_node, to_node).is_some() {
            return Err(Error::DuplicateDependency {
                from: from.clone(),
                to: to.clone(),
            });
        }

        if self.would_create_cycle(from, to) {
            return Err(Error::CircularDependency {
                from: from.clone(),
                to: to.clone(),
            });
        }

        self.graph.add_edge(from_node, to_node, ());
        Ok(())
    }

    /// Delete the edge `from -> to` if present; no-op otherwise.
    pub fn remove_dependency(&mut self, from: &InitiativeId, to: &InitiativeId) {
        let (Some(&from_node), Some(&to_node)) = (self.node_map.get(from), self.node_map.get(to))
        else {
            return;
        };
        if let Some(edge) = self.graph.find_edge(from_node, to_node) {
            self.graph.remove_edge(edge);
        }
    }

    /// Check whether inserting `from -> to` would close a cycle.
    ///
    /// "`from` depends on `to`" is only cyclic if `to` already depends,
    /// transitively, on `from` -- equivalently, if `to` is a transitive
    /// *dependent* of `from`. So the search starts at `from`, follows
    /// reverse edges (who depends on the current node), and reports a
    /// cycle if it reaches `to`. Breadth-first with a visited-set guard;
    /// terminates because nodes are finite and each is visited once.
    #[must_use]
    pub fn would_create_cycle(&self, from: &InitiativeId, to: &InitiativeId) -> bool {
        let (Some(&from_node), Some(&to_node)) = (self.node_map.get(from), self.node_map.get(to))
        else {
            return false;
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        visited.insert(from_node);
        queue.push_back(from_node);

        while let Some(current) = queue.pop_front() {
            if current == to_node {
                return true;
            }
            for edge in self.graph.edges_directed(current, Direction::Incoming) {
                let dependent = edge.source();
                if visited.insert(dependent) {
                    queue.push_back(dependent);
                }
            }
        }

        false
    }

    /// Direct dependencies of the initiative.
    #[must_use]
    pub fn dependencies(&self, id: &InitiativeId) -> Vec<InitiativeId> {
        let Some(&node) = self.node_map.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges(node)
            .map(|edge| self.graph[edge.target()].clone())
            .collect()
    }

    /// Initiatives that directly declare a dependency on the argument.
    #[must_use]
    pub fn dependents(&self, id: &InitiativeId) -> HashSet<InitiativeId> {
        let Some(&node) = self.node_map.get(id) else {
            return HashSet::new();
        };
        self.graph
            .edges_directed(node, Direction::Incoming)
            .map(|edge| self.graph[edge.source()].clone())
            .collect()
    }

    /// Whether the initiative has at least one unfinished direct dependency.
    ///
    /// One hop only; dependencies missing from the supplied records are
    /// ignored so a stale edge cannot wedge an initiative.
    #[must_use]
    pub fn is_blocked(
        &self,
        id: &InitiativeId,
        initiatives: &HashMap<InitiativeId, Initiative>,
    ) -> bool {
        let Some(&node) = self.node_map.get(id) else {
            return false;
        };
        self.graph.edges(node).any(|edge| {
            initiatives
                .get(&self.graph[edge.target()])
                .is_some_and(|dep| dep.status != InitiativeStatus::Done)
        })
    }

    /// Direct dependencies of the initiative that are not yet done.
    #[must_use]
    pub fn blocking_dependencies(
        &self,
        id: &InitiativeId,
        initiatives: &HashMap<InitiativeId, Initiative>,
    ) -> Vec<InitiativeId> {
        let Some(&node) = self.node_map.get(id) else {
            return Vec::new();
        };
        self.graph
            .edges(node)
            .filter_map(|edge| {
                let dep_id = &self.graph[edge.target()];
                initiatives
                    .get(dep_id)
                    .filter(|dep| dep.status != InitiativeStatus::Done)
                    .map(|_| dep_id.clone())
            })
            .collect()
    }
}
