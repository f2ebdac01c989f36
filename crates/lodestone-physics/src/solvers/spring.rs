//! Hooke-law edge springs.

use crate::options::{PhysicsOptions, PhysicsOptionsPatch};
use crate::solver::{PhysicsState, Solver};
use lodestone_core::GraphView;

/// Plain spring solver: every connected, non-self edge pulls its endpoints
/// toward the rest length, equal and opposite. Edges may override the
/// global rest length.
pub struct SpringSolver {
    options: PhysicsOptions,
}

impl SpringSolver {
    pub fn new(options: &PhysicsOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }
}

impl Solver for SpringSolver {
    fn solve(&mut self, graph: &mut GraphView, state: &mut PhysicsState) {
        let spring_constant = self.options.spring_constant;
        let default_length = self.options.spring_length;
        let edge_ids: Vec<_> = graph.edge_ids().collect();
        for edge_id in edge_ids {
            let Some(edge) = graph.edge(edge_id) else { continue };
            if !edge.connected || edge.is_self_loop() {
                continue;
            }
            let (Some(from), Some(to)) = (graph.node(edge.from), graph.node(edge.to)) else {
                continue;
            };
            let rest_length = edge.length.unwrap_or(default_length);
            let dx = from.x - to.x;
            let dy = from.y - to.y;
            let distance = (dx * dx + dy * dy).sqrt().max(0.01);
            let spring_force = spring_constant * (rest_length - distance) / distance;
            let (from_id, to_id) = (edge.from, edge.to);
            state.add_force(from_id, dx * spring_force, dy * spring_force);
            state.add_force(to_id, -dx * spring_force, -dy * spring_force);
        }
    }

    fn apply_patch(&mut self, patch: &PhysicsOptionsPatch) {
        self.options.apply(patch);
    }
}
