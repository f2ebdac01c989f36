//! Core domain types shared across the Lodestone workspace.
//!
//! The physics and layout crates operate on a *view* of the graph: node
//! bodies carrying position/mass/shape data and edges carrying connectivity.
//! Rendering, gesture handling, and data-set management live outside this
//! workspace; they hand the engine a [`GraphView`] and read positions back.

pub mod selection;

pub use selection::{SelectionAccumulator, SelectionDiff};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifier for nodes within a [`GraphView`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub u64);

/// Identifier for edges within a [`GraphView`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u64);

/// Physics view of a node: a 2-D point mass with a shape extent.
///
/// Nodes are owned by the data layer; the simulation reads mass, position,
/// and shape, and writes updated positions through the driver. A node with
/// `mass <= 0` participates in no force exchange, though its force-map entry
/// still exists while physics is enabled for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsNode {
    /// Unique identifier.
    pub id: NodeId,
    /// X position.
    pub x: f64,
    /// Y position.
    pub y: f64,
    /// Point mass (>= 0; zero-mass nodes exert and receive no force).
    pub mass: f64,
    /// Shape radius, used for overlap avoidance.
    pub radius: f64,
    /// Shape width.
    pub width: f64,
    /// Shape height.
    pub height: f64,
    /// Whether this node takes part in the simulation at all.
    pub physics: bool,
    /// Pin the X axis (position and velocity held at zero change).
    pub fixed_x: bool,
    /// Pin the Y axis.
    pub fixed_y: bool,
    /// Hierarchy level, only meaningful in hierarchical layout mode.
    pub level: Option<i64>,
}

impl PhysicsNode {
    /// Create a node at a position with default mass and shape.
    pub fn new(id: NodeId, x: f64, y: f64) -> Self {
        Self {
            id,
            x,
            y,
            mass: 1.0,
            radius: 10.0,
            width: 20.0,
            height: 20.0,
            physics: true,
            fixed_x: false,
            fixed_y: false,
            level: None,
        }
    }

    /// Set the mass, returning the node for chaining.
    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    /// Set the shape radius (width/height follow as the bounding square).
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self.width = radius * 2.0;
        self.height = radius * 2.0;
        self
    }

    /// Set the hierarchy level.
    pub fn with_level(mut self, level: i64) -> Self {
        self.level = Some(level);
        self
    }

    /// Pin both axes.
    pub fn pinned(mut self) -> Self {
        self.fixed_x = true;
        self.fixed_y = true;
        self
    }

    /// Whether the node contributes to gravity/repulsion exchange.
    pub fn is_massive(&self) -> bool {
        self.mass > 0.0
    }
}

/// Physics view of an edge between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsEdge {
    /// Unique identifier.
    pub id: EdgeId,
    /// Originating node.
    pub from: NodeId,
    /// Destination node.
    pub to: NodeId,
    /// False when either endpoint is absent or hidden; such edges are
    /// skipped by every solver and traversal.
    pub connected: bool,
    /// Edge-specific rest length, overriding the global spring length.
    pub length: Option<f64>,
}

impl PhysicsEdge {
    /// Create a connected edge with no rest-length override.
    pub fn new(id: EdgeId, from: NodeId, to: NodeId) -> Self {
        Self {
            id,
            from,
            to,
            connected: true,
            length: None,
        }
    }

    /// Set an edge-specific rest length.
    pub fn with_length(mut self, length: f64) -> Self {
        self.length = Some(length);
        self
    }

    /// Self-loops contribute no linear spring force and are handled only by
    /// rendering.
    pub fn is_self_loop(&self) -> bool {
        self.from == self.to
    }

    /// The endpoint opposite to `id`, if `id` is an endpoint.
    pub fn other_end(&self, id: NodeId) -> Option<NodeId> {
        if self.from == id {
            Some(self.to)
        } else if self.to == id {
            Some(self.from)
        } else {
            None
        }
    }
}

/// The node/edge collections the simulation core reads.
///
/// Iteration order over nodes and edges follows insertion order, which keeps
/// solver passes deterministic for a given seed.
#[derive(Debug, Default, Clone)]
pub struct GraphView {
    nodes: HashMap<NodeId, PhysicsNode>,
    edges: HashMap<EdgeId, PhysicsEdge>,
    adjacency: HashMap<NodeId, Vec<EdgeId>>,
    node_order: Vec<NodeId>,
    edge_order: Vec<EdgeId>,
}

impl GraphView {
    /// Create an empty graph view.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node. Replaces any node with the same id in place, keeping
    /// its original insertion position.
    pub fn add_node(&mut self, node: PhysicsNode) {
        let id = node.id;
        if self.nodes.insert(id, node).is_none() {
            self.node_order.push(id);
            self.adjacency.entry(id).or_default();
        }
    }

    /// Insert an edge and register it with both endpoints' adjacency lists
    /// (once for self-loops).
    pub fn add_edge(&mut self, edge: PhysicsEdge) {
        let id = edge.id;
        let (from, to) = (edge.from, edge.to);
        if self.edges.insert(id, edge).is_none() {
            self.edge_order.push(id);
            self.adjacency.entry(from).or_default().push(id);
            if from != to {
                self.adjacency.entry(to).or_default().push(id);
            }
        }
    }

    /// Look up a node.
    pub fn node(&self, id: NodeId) -> Option<&PhysicsNode> {
        self.nodes.get(&id)
    }

    /// Look up a node mutably.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut PhysicsNode> {
        self.nodes.get_mut(&id)
    }

    /// Look up an edge.
    pub fn edge(&self, id: EdgeId) -> Option<&PhysicsEdge> {
        self.edges.get(&id)
    }

    /// Look up an edge mutably.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut PhysicsEdge> {
        self.edges.get_mut(&id)
    }

    /// Number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.node_order.iter().copied()
    }

    /// Edge ids in insertion order.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.edge_order.iter().copied()
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &PhysicsEdge> + '_ {
        self.edge_order.iter().filter_map(|id| self.edges.get(id))
    }

    /// Ids of incident edges for a node, in registration order.
    pub fn edges_of(&self, id: NodeId) -> &[EdgeId] {
        self.adjacency.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of connected incident edges. Used by the ForceAtlas2 solver
    /// variants to weight force by connectivity.
    pub fn degree(&self, id: NodeId) -> usize {
        self.edges_of(id)
            .iter()
            .filter(|eid| {
                self.edges
                    .get(eid)
                    .map(|e| e.connected)
                    .unwrap_or(false)
            })
            .count()
    }

    /// Ids of nodes with physics enabled, in insertion order.
    pub fn physics_node_ids(&self) -> Vec<NodeId> {
        self.node_order
            .iter()
            .copied()
            .filter(|id| self.nodes.get(id).map(|n| n.physics).unwrap_or(false))
            .collect()
    }

    /// Recompute every edge's `connected` flag from endpoint presence.
    pub fn refresh_connectivity(&mut self) {
        let present: Vec<(EdgeId, bool)> = self
            .edge_order
            .iter()
            .filter_map(|id| self.edges.get(id))
            .map(|e| {
                (
                    e.id,
                    self.nodes.contains_key(&e.from) && self.nodes.contains_key(&e.to),
                )
            })
            .collect();
        for (id, connected) in present {
            if let Some(edge) = self.edges.get_mut(&id) {
                edge.connected = connected;
            }
        }
    }

    /// Convert to a petgraph `StableDiGraph` for analysis tooling.
    /// Returns the graph and a mapping from `NodeId` to `NodeIndex`.
    pub fn to_petgraph(&self) -> (StableDiGraph<NodeId, EdgeId>, HashMap<NodeId, NodeIndex>) {
        let mut graph = StableDiGraph::new();
        let mut id_to_index = HashMap::new();

        for id in &self.node_order {
            let idx = graph.add_node(*id);
            id_to_index.insert(*id, idx);
        }

        for edge in self.edges() {
            if let (Some(&from_idx), Some(&to_idx)) =
                (id_to_index.get(&edge.from), id_to_index.get(&edge.to))
            {
                graph.add_edge(from_idx, to_idx, edge.id);
            }
        }

        (graph, id_to_index)
    }
}
