//! Selection bookkeeping for graph interaction layers.
//!
//! Mutations accumulate in a working set and only become observable to
//! listeners when committed; `commit` reports exactly what changed since the
//! previous commit.

use crate::{EdgeId, NodeId};
use std::collections::HashSet;

/// What changed for one kind of item between two commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDelta<T> {
    /// Items selected now that were not selected at the previous commit.
    pub added: Vec<T>,
    /// Items selected at the previous commit that no longer are.
    pub deleted: Vec<T>,
    /// The full selection as of the previous commit.
    pub previous: Vec<T>,
    /// The full selection as of this commit.
    pub current: Vec<T>,
}

impl<T> SelectionDelta<T> {
    /// True when nothing was added or deleted.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.deleted.is_empty()
    }
}

/// Node and edge deltas produced by one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionDiff {
    /// Node selection changes.
    pub nodes: SelectionDelta<NodeId>,
    /// Edge selection changes.
    pub edges: SelectionDelta<EdgeId>,
}

impl SelectionDiff {
    /// True when the commit changed nothing.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }
}

/// Tracks node/edge selection sets with commit semantics.
///
/// Invariants: `added` and `deleted` in a diff are disjoint;
/// `previous + added - deleted == current`; a commit with no intervening
/// mutations yields empty deltas.
#[derive(Debug, Clone, Default)]
pub struct SelectionAccumulator {
    nodes: HashSet<NodeId>,
    edges: HashSet<EdgeId>,
    committed_nodes: HashSet<NodeId>,
    committed_edges: HashSet<EdgeId>,
}

impl SelectionAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node to the working selection. Returns true if newly added.
    pub fn add_node(&mut self, id: NodeId) -> bool {
        self.nodes.insert(id)
    }

    /// Remove a node from the working selection. Returns true if present.
    pub fn delete_node(&mut self, id: NodeId) -> bool {
        self.nodes.remove(&id)
    }

    /// Add an edge to the working selection. Returns true if newly added.
    pub fn add_edge(&mut self, id: EdgeId) -> bool {
        self.edges.insert(id)
    }

    /// Remove an edge from the working selection. Returns true if present.
    pub fn delete_edge(&mut self, id: EdgeId) -> bool {
        self.edges.remove(&id)
    }

    /// Whether a node is in the working selection.
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }

    /// Whether an edge is in the working selection.
    pub fn contains_edge(&self, id: EdgeId) -> bool {
        self.edges.contains(&id)
    }

    /// Number of nodes in the working selection.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges in the working selection.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Clear the working selection (takes effect at the next commit).
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Promote the working set to the committed set and return the diff
    /// against the previously committed state.
    pub fn commit(&mut self) -> SelectionDiff {
        let nodes = Self::delta(&self.committed_nodes, &self.nodes);
        let edges = Self::delta(&self.committed_edges, &self.edges);
        self.committed_nodes = self.nodes.clone();
        self.committed_edges = self.edges.clone();
        SelectionDiff { nodes, edges }
    }

    fn delta<T: Copy + Eq + std::hash::Hash + Ord>(
        previous: &HashSet<T>,
        current: &HashSet<T>,
    ) -> SelectionDelta<T> {
        let mut added: Vec<T> = current.difference(previous).copied().collect();
        let mut deleted: Vec<T> = previous.difference(current).copied().collect();
        let mut prev: Vec<T> = previous.iter().copied().collect();
        let mut cur: Vec<T> = current.iter().copied().collect();
        // Sorted output keeps diffs reproducible for listeners and tests.
        added.sort();
        deleted.sort();
        prev.sort();
        cur.sort();
        SelectionDelta {
            added,
            deleted,
            previous: prev,
            current: cur,
        }
    }
}
