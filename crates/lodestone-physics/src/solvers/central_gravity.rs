//! Pull toward the origin.

use crate::options::{PhysicsOptions, PhysicsOptionsPatch};
use crate::solver::{PhysicsState, Solver};
use lodestone_core::GraphView;

/// Plain central gravity: a constant-magnitude pull toward the origin,
/// independent of distance (`centralGravity / distance` scaling the raw
/// offset). Explicitly zero at the origin itself.
pub struct CentralGravitySolver {
    options: PhysicsOptions,
}

impl CentralGravitySolver {
    pub fn new(options: &PhysicsOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }
}

impl Solver for CentralGravitySolver {
    fn solve(&mut self, graph: &mut GraphView, state: &mut PhysicsState) {
        let central_gravity = self.options.central_gravity;
        for i in 0..state.node_ids.len() {
            let id = state.node_ids[i];
            let Some(node) = graph.node(id) else { continue };
            let dx = -node.x;
            let dy = -node.y;
            let distance = (dx * dx + dy * dy).sqrt();
            let gravity_force = if distance == 0.0 {
                0.0
            } else {
                central_gravity / distance
            };
            state.add_force(id, dx * gravity_force, dy * gravity_force);
        }
    }

    fn apply_patch(&mut self, patch: &PhysicsOptionsPatch) {
        self.options.apply(patch);
    }
}
