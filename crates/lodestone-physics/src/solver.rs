//! The solver contract and the shared per-step state it writes into.

use crate::options::PhysicsOptionsPatch;
use lodestone_core::{GraphView, NodeId};
use std::collections::HashMap;

/// Accumulated force on one node for the current step.
///
/// `spring_fx`/`spring_fy` are auxiliary accumulators used only by the
/// hierarchical spring solver, which clamps them before folding them into
/// the linear force.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Force {
    pub x: f64,
    pub y: f64,
    pub spring_fx: f64,
    pub spring_fy: f64,
}

/// Velocity of one node, carried across steps.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f64,
    pub y: f64,
}

impl Velocity {
    /// Speed (Euclidean norm).
    pub fn speed(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

/// Per-step simulation state shared by all solvers.
///
/// The driver guarantees that before any solver runs, a force entry exists
/// for every physics-enabled node; solvers never create entries lazily.
/// Zero-mass nodes keep their entries too; they simply receive no force.
#[derive(Debug, Default, Clone)]
pub struct PhysicsState {
    /// Physics-enabled node ids in graph insertion order. Solvers iterate
    /// this list so passes stay deterministic.
    pub node_ids: Vec<NodeId>,
    /// Force accumulator keyed by node id.
    pub forces: HashMap<NodeId, Force>,
    /// Velocity map keyed by node id.
    pub velocities: HashMap<NodeId, Velocity>,
}

impl PhysicsState {
    /// Refresh the node list from the graph, dropping state for nodes that
    /// left the simulation and zero-initializing velocity for newcomers.
    pub fn rebuild(&mut self, graph: &GraphView) {
        self.node_ids = graph.physics_node_ids();
        self.forces.retain(|id, _| graph.node(*id).is_some());
        self.velocities.retain(|id, _| graph.node(*id).is_some());
        for id in &self.node_ids {
            self.velocities.entry(*id).or_default();
        }
        self.reset_forces();
    }

    /// Reset every force entry to a fresh zero state. Called once per step,
    /// before the first solver.
    pub fn reset_forces(&mut self) {
        for id in &self.node_ids {
            self.forces.insert(*id, Force::default());
        }
    }

    /// Add a linear force contribution to a node, ignoring nodes outside
    /// the simulation.
    pub fn add_force(&mut self, id: NodeId, fx: f64, fy: f64) {
        if let Some(force) = self.forces.get_mut(&id) {
            force.x += fx;
            force.y += fy;
        }
    }

    /// Add a spring-accumulator contribution to a node.
    pub fn add_spring_force(&mut self, id: NodeId, fx: f64, fy: f64) {
        if let Some(force) = self.forces.get_mut(&id) {
            force.spring_fx += fx;
            force.spring_fy += fy;
        }
    }
}

/// One force solver. Implementations accumulate into the shared
/// [`PhysicsState`]; the driver runs them sequentially in a fixed order, so
/// no locking is needed.
///
/// `solve` takes the graph mutably because the Barnes-Hut tree builder may
/// jitter the position of exactly-overlapping nodes.
pub trait Solver {
    /// Accumulate this solver's forces for the current step.
    fn solve(&mut self, graph: &mut GraphView, state: &mut PhysicsState);

    /// Fold a configuration patch into the solver. Absent fields keep their
    /// prior values.
    fn apply_patch(&mut self, patch: &PhysicsOptionsPatch);
}
