//! Raw dependency graph produced by collection, backed by a petgraph arena.
//!
//! Every occurrence of a coordinate gets its own node, so the graph is a
//! forest rooted at the declared dependencies. Nodes refer to their
//! children by index; cycles never become edges.

use std::fmt;

use jarpath_core::coordinate::{Coordinate, IdentityKey};
use jarpath_core::scope::Scope;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;

/// One occurrence of a coordinate in the collected graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphNode {
    pub coordinate: Coordinate,
    /// Effective scope after propagation from the parent.
    pub scope: Scope,
    /// Scope written on the edge that introduced this occurrence.
    pub declared_scope: Scope,
    /// Distance from the synthetic root; declared dependencies are at 1.
    pub depth: usize,
    /// Index of the root dependency this node descends from.
    pub declaration_order: usize,
    /// Global enqueue order, assigned during breadth-first collection.
    pub sequence: usize,
    pub optional: bool,
}

impl GraphNode {
    pub fn key(&self) -> IdentityKey {
        self.coordinate.key()
    }

    /// Ordering used to pick between occurrences of the same identity key:
    /// nearest first, then earliest declared, then earliest discovered.
    pub fn rank(&self) -> (usize, usize, usize) {
        (self.depth, self.declaration_order, self.sequence)
    }
}

impl fmt::Display for GraphNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.coordinate, self.scope)?;
        if self.optional {
            write!(f, " optional")?;
        }
        Ok(())
    }
}

/// Edge label: position of the child among its parent's declared
/// dependencies.
#[derive(Debug, Clone, Copy)]
pub struct DepEdge {
    pub ordinal: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, DepEdge>,
    roots: Vec<NodeIndex>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency declared directly by the caller.
    pub fn add_root(&mut self, node: GraphNode) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.roots.push(idx);
        idx
    }

    /// Add `node` as the next child of `parent`.
    pub fn add_child(&mut self, parent: NodeIndex, node: GraphNode) -> NodeIndex {
        let ordinal = self
            .graph
            .edges_directed(parent, Direction::Outgoing)
            .count();
        let idx = self.graph.add_node(node);
        self.graph.add_edge(parent, idx, DepEdge { ordinal });
        idx
    }

    pub fn node(&self, idx: NodeIndex) -> &GraphNode {
        &self.graph[idx]
    }

    /// Declared dependencies in declaration order.
    pub fn roots(&self) -> &[NodeIndex] {
        &self.roots
    }

    /// Children of a node in declaration order.
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut edges: Vec<(usize, NodeIndex)> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| (e.weight().ordinal, e.target()))
            .collect();
        edges.sort_unstable_by_key(|(ordinal, _)| *ordinal);
        edges.into_iter().map(|(_, child)| child).collect()
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .map(|e| e.source())
    }

    /// Nodes from the root dependency down to `idx`, inclusive.
    pub fn path_to(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut path = vec![idx];
        let mut current = idx;
        while let Some(parent) = self.parent(current) {
            path.push(parent);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Whether `key` appears on the chain from the root down to `idx`.
    pub fn on_ancestor_chain(&self, idx: NodeIndex, key: &IdentityKey) -> bool {
        let mut current = Some(idx);
        while let Some(node) = current {
            if key.matches(&self.graph[node].coordinate) {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = (NodeIndex, &GraphNode)> {
        self.graph
            .node_indices()
            .map(move |idx| (idx, &self.graph[idx]))
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}
