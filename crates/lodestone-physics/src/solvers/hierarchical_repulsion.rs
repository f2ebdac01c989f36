//! Exact pairwise repulsion for hierarchical layouts.

use crate::options::{PhysicsOptions, PhysicsOptionsPatch};
use crate::solver::{PhysicsState, Solver};
use lodestone_core::GraphView;

/// Falloff steepness of the repulsion curve.
const STEEPNESS: f64 = 0.05;

/// Pairwise repulsion restricted to nodes on the same hierarchy level.
/// Within-level populations are small enough that the exact O(n²) pass
/// beats building a tree. Cross-level separation is the spring solver's
/// job, so cross-level pairs exert nothing here.
///
/// The force follows a quadratic falloff that reaches exactly zero at the
/// target separation, so nodes drifting past it feel no discontinuity.
pub struct HierarchicalRepulsionSolver {
    options: PhysicsOptions,
}

impl HierarchicalRepulsionSolver {
    pub fn new(options: &PhysicsOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }
}

impl Solver for HierarchicalRepulsionSolver {
    fn solve(&mut self, graph: &mut GraphView, state: &mut PhysicsState) {
        let node_distance = self.options.node_distance;
        let overlap = self.options.overlap_avoidance_factor();
        for i in 0..state.node_ids.len() {
            for j in (i + 1)..state.node_ids.len() {
                let (a_id, b_id) = (state.node_ids[i], state.node_ids[j]);
                let (Some(a), Some(b)) = (graph.node(a_id), graph.node(b_id)) else {
                    continue;
                };
                // Unassigned levels all repel each other as level 0.
                if a.level.unwrap_or(0) != b.level.unwrap_or(0) {
                    continue;
                }
                let target = node_distance + overlap * 0.5 * (a.radius + b.radius);
                let dx = b.x - a.x;
                let dy = b.y - a.y;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance >= target {
                    continue;
                }
                // Coincident nodes have no direction to push along; the
                // offset is zero so the force degenerates to zero too.
                let repulsing_force = if distance == 0.0 {
                    0.0
                } else {
                    (-(STEEPNESS * distance).powi(2) + (STEEPNESS * target).powi(2)) / distance
                };
                let fx = dx * repulsing_force;
                let fy = dy * repulsing_force;
                state.add_force(a_id, -fx, -fy);
                state.add_force(b_id, fx, fy);
            }
        }
    }

    fn apply_patch(&mut self, patch: &PhysicsOptionsPatch) {
        self.options.apply(patch);
    }
}
