//! Level-aware spring solver.

use crate::options::{PhysicsOptions, PhysicsOptionsPatch};
use crate::solver::{PhysicsState, Solver};
use lodestone_core::GraphView;

/// Fraction of the plain spring force applied to same-level edges. Their
/// attraction is secondary to the layout axis, so it bypasses the clamp at
/// reduced strength.
const IN_LEVEL_FACTOR: f64 = 0.5;

/// Per-axis bound on the accumulated cross-level spring force.
const SPRING_FORCE_LIMIT: f64 = 1.0;

/// Spring solver for hierarchical layouts.
///
/// Cross-level edges accumulate into the auxiliary spring channel so the
/// total per node can be clamped before entering the main force, keeping a
/// single long edge from dominating convergence. After folding, the mean
/// force over all nodes is subtracted from every node so an asymmetric
/// spring layout cannot drift the whole graph.
pub struct HierarchicalSpringSolver {
    options: PhysicsOptions,
}

impl HierarchicalSpringSolver {
    pub fn new(options: &PhysicsOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }
}

impl Solver for HierarchicalSpringSolver {
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
            let fx = dx * spring_force;
            let fy = dy * spring_force;
            let (from_id, to_id) = (edge.from, edge.to);
            if from.level.unwrap_or(0) != to.level.unwrap_or(0) {
                state.add_spring_force(from_id, fx, fy);
                state.add_spring_force(to_id, -fx, -fy);
            } else {
                state.add_force(from_id, IN_LEVEL_FACTOR * fx, IN_LEVEL_FACTOR * fy);
                state.add_force(to_id, -IN_LEVEL_FACTOR * fx, -IN_LEVEL_FACTOR * fy);
            }
        }

        // Fold the clamped spring channel into the main force.
        for i in 0..state.node_ids.len() {
            let id = state.node_ids[i];
            if let Some(force) = state.forces.get_mut(&id) {
                force.x += force
                    .spring_fx
                    .clamp(-SPRING_FORCE_LIMIT, SPRING_FORCE_LIMIT);
                force.y += force
                    .spring_fy
                    .clamp(-SPRING_FORCE_LIMIT, SPRING_FORCE_LIMIT);
            }
        }

        // Subtract the mean force so the graph as a whole does not drift.
        let count = state.node_ids.len();
        if count == 0 {
            return;
        }
        let mut total_fx = 0.0;
        let mut total_fy = 0.0;
        for id in &state.node_ids {
            if let Some(force) = state.forces.get(id) {
                total_fx += force.x;
                total_fy += force.y;
            }
        }
        let correction_fx = total_fx / count as f64;
        let correction_fy = total_fy / count as f64;
        for i in 0..count {
            let id = state.node_ids[i];
            if let Some(force) = state.forces.get_mut(&id) {
                force.x -= correction_fx;
                force.y -= correction_fy;
            }
        }
    }

    fn apply_patch(&mut self, patch: &PhysicsOptionsPatch) {
        self.options.apply(patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::{EdgeId, NodeId, PhysicsEdge, PhysicsNode};

    fn solve(graph: &mut GraphView) -> PhysicsState {
        let mut state = PhysicsState::default();
        state.rebuild(graph);
        let mut solver = HierarchicalSpringSolver::new(&PhysicsOptions::hierarchical());
        solver.solve(graph, &mut state);
        state
    }

    #[test]
    fn same_level_pair_forces_sum_to_zero() {
        let mut graph = GraphView::new();
        graph.add_node(PhysicsNode::new(NodeId(1), 0.0, 0.0).with_level(0));
        graph.add_node(PhysicsNode::new(NodeId(2), 300.0, 0.0).with_level(0));
        graph.add_edge(PhysicsEdge::new(EdgeId(1), NodeId(1), NodeId(2)));
        let state = solve(&mut graph);
        let f1 = state.forces[&NodeId(1)];
        let f2 = state.forces[&NodeId(2)];
        assert!((f1.x + f2.x).abs() < 1e-12);
        assert!((f1.y + f2.y).abs() < 1e-12);
        // Stretched edge still attracts after the mean correction.
        assert!(f1.x > 0.0);
    }

    #[test]
    fn same_level_edges_apply_half_strength_directly() {
        let mut graph = GraphView::new();
        graph.add_node(PhysicsNode::new(NodeId(1), 0.0, 0.0).with_level(0));
        graph.add_node(PhysicsNode::new(NodeId(2), 300.0, 0.0).with_level(0));
        graph.add_edge(PhysicsEdge::new(EdgeId(1), NodeId(1), NodeId(2)));
        let state = solve(&mut graph);
        let options = PhysicsOptions::hierarchical();
        // Half of the plain Hooke force; the mean correction is zero for a
        // symmetric pair. dx = -300 for node 1.
        let spring_force = options.spring_constant * (options.spring_length - 300.0) / 300.0;
        let expected = 0.5 * -300.0 * spring_force;
        assert!((state.forces[&NodeId(1)].x - expected).abs() < 1e-12);
        // The clamped spring channel is untouched by same-level edges.
        assert_eq!(state.forces[&NodeId(1)].spring_fx, 0.0);
    }

    #[test]
    fn cross_level_edges_route_through_the_clamped_channel() {
        let mut graph = GraphView::new();
        // Extremely stretched edge: the raw spring force is far beyond 1.
        graph.add_node(PhysicsNode::new(NodeId(1), 0.0, 0.0).with_level(0));
        graph.add_node(PhysicsNode::new(NodeId(2), 10_000.0, 0.0).with_level(1));
        graph.add_edge(PhysicsEdge::new(EdgeId(1), NodeId(1), NodeId(2)));
        let state = solve(&mut graph);
        // After clamping to [-1, 1] and subtracting the (zero) mean, each
        // node ends up with at most unit force per axis.
        assert!(state.forces[&NodeId(1)].x.abs() <= 1.0);
        assert!(state.forces[&NodeId(2)].x.abs() <= 1.0);
        // The stretched edge pulls node 1 toward node 2.
        assert!(state.forces[&NodeId(1)].x > 0.0);
        assert!(state.forces[&NodeId(2)].x < 0.0);
    }

    #[test]
    fn mean_correction_removes_net_drift() {
        // A lopsided three-node chain across levels.
        let mut graph = GraphView::new();
        graph.add_node(PhysicsNode::new(NodeId(1), 0.0, 0.0).with_level(0));
        graph.add_node(PhysicsNode::new(NodeId(2), 40.0, 170.0).with_level(1));
        graph.add_node(PhysicsNode::new(NodeId(3), -25.0, 320.0).with_level(2));
        graph.add_edge(PhysicsEdge::new(EdgeId(1), NodeId(1), NodeId(2)));
        graph.add_edge(PhysicsEdge::new(EdgeId(2), NodeId(2), NodeId(3)));
        let state = solve(&mut graph);
        let (mut sum_x, mut sum_y) = (0.0, 0.0);
        for id in [NodeId(1), NodeId(2), NodeId(3)] {
            sum_x += state.forces[&id].x;
            sum_y += state.forces[&id].y;
        }
        assert!(sum_x.abs() < 1e-12);
        assert!(sum_y.abs() < 1e-12);
    }
}
