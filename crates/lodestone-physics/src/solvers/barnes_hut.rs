//! Tree-approximated repulsion.

use crate::options::{PhysicsOptions, PhysicsOptionsPatch};
use crate::rng::SolverRng;
use crate::solver::{PhysicsState, Solver};
use crate::tree::BarnesHutTree;
use lodestone_core::GraphView;

const RNG_LABEL: &str = "barnes-hut-solver";

/// Barnes-Hut repulsion: rebuilds the quadtree each step and pushes every
/// massive node away from the admissible branches.
///
/// The force law uses a cubic distance denominator so `(dx, dy)` stands in
/// for `distance * direction` without explicit trigonometry:
///
/// `F = G * m_branch * m_node / d^3 * (dx, dy)`
pub struct BarnesHutSolver {
    options: PhysicsOptions,
    rng: SolverRng,
}

impl BarnesHutSolver {
    pub fn new(options: &PhysicsOptions) -> Self {
        Self {
            options: options.clone(),
            rng: SolverRng::new(options.random_seed, RNG_LABEL),
        }
    }
}

impl Solver for BarnesHutSolver {
    fn solve(&mut self, graph: &mut GraphView, state: &mut PhysicsState) {
        let tree = BarnesHutTree::build(graph, &state.node_ids, &mut self.rng);
        if tree.is_empty() {
            return;
        }
        let theta_inverted = 1.0 / self.options.theta;
        let g = self.options.gravitational_constant;
        let overlap = self.options.overlap_avoidance_factor();

        for i in 0..state.node_ids.len() {
            let id = state.node_ids[i];
            let Some(node) = graph.node(id) else { continue };
            if !node.is_massive() {
                continue;
            }
            let (x, y, mass, radius) = (node.x, node.y, node.mass, node.radius);
            let mut fx = 0.0;
            let mut fy = 0.0;
            tree.for_each_interaction(id, x, y, theta_inverted, &mut |branch_mass,
                                                                      com_x,
                                                                      com_y,
                                                                      _max_width| {
                let mut dx = com_x - x;
                let dy = com_y - y;
                let mut distance = (dx * dx + dy * dy).sqrt();
                if distance == 0.0 {
                    // Nominal separation; direction does not matter here.
                    distance = 0.1;
                    dx = distance;
                }
                if overlap > 0.0 {
                    distance = (distance - overlap * 0.5 * radius).max(0.1);
                }
                let gravity_force = g * branch_mass * mass / (distance * distance * distance);
                fx += dx * gravity_force;
                fy += dy * gravity_force;
            });
            state.add_force(id, fx, fy);
        }
    }

    fn apply_patch(&mut self, patch: &PhysicsOptionsPatch) {
        self.options.apply(patch);
        if let Some(seed) = patch.random_seed {
            self.rng = SolverRng::new(seed, RNG_LABEL);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::{NodeId, PhysicsNode};

    fn two_node_graph(separation: f64) -> GraphView {
        let mut graph = GraphView::new();
        graph.add_node(PhysicsNode::new(NodeId(1), 0.0, 0.0));
        graph.add_node(PhysicsNode::new(NodeId(2), separation, 0.0));
        graph
    }

    fn solve(graph: &mut GraphView, options: PhysicsOptions) -> PhysicsState {
        let mut state = PhysicsState::default();
        state.rebuild(graph);
        let mut solver = BarnesHutSolver::new(&options);
        solver.solve(graph, &mut state);
        state
    }

    #[test]
    fn two_nodes_repel_along_their_axis() {
        let mut graph = two_node_graph(100.0);
        let state = solve(&mut graph, PhysicsOptions::barnes_hut());
        let f1 = state.forces[&NodeId(1)];
        let f2 = state.forces[&NodeId(2)];
        // Negative constant pushes the nodes apart, symmetrically.
        assert!(f1.x < 0.0);
        assert!(f2.x > 0.0);
        assert!((f1.x + f2.x).abs() < 1e-9);
        assert_eq!(f1.y, 0.0);
    }

    #[test]
    fn repulsion_matches_the_pairwise_law_for_two_nodes() {
        let mut graph = two_node_graph(50.0);
        let options = PhysicsOptions::barnes_hut();
        let state = solve(&mut graph, options.clone());
        // Two leaves are always computed exactly: F = G*m*m/d^3 * dx.
        // Node 1 sees dx = +50, so its force carries the sign of G.
        let expected = options.gravitational_constant / (50.0 * 50.0 * 50.0) * 50.0;
        assert!((state.forces[&NodeId(1)].x - expected).abs() < 1e-9);
        assert!((state.forces[&NodeId(2)].x + expected).abs() < 1e-9);
    }

    #[test]
    fn small_theta_converges_to_the_exact_pairwise_sum() {
        let exact = |graph: &GraphView, id: NodeId, g: f64| {
            let node = graph.node(id).unwrap();
            let mut fx = 0.0;
            let mut fy = 0.0;
            for other_id in graph.node_ids() {
                if other_id == id {
                    continue;
                }
                let other = graph.node(other_id).unwrap();
                let dx = other.x - node.x;
                let dy = other.y - node.y;
                let d = (dx * dx + dy * dy).sqrt();
                let f = g * other.mass * node.mass / (d * d * d);
                fx += dx * f;
                fy += dy * f;
            }
            (fx, fy)
        };

        let build = || {
            let mut graph = GraphView::new();
            // Deterministic scattered cloud.
            for i in 0..20u64 {
                let angle = i as f64 * 0.7;
                let r = 40.0 + 13.0 * (i as f64);
                graph.add_node(PhysicsNode::new(
                    NodeId(i),
                    r * angle.cos(),
                    r * angle.sin(),
                ));
            }
            graph
        };

        let mut options = PhysicsOptions::barnes_hut();
        options.theta = 1e-9;
        let mut graph = build();
        let state = solve(&mut graph, options.clone());
        let reference = build();
        for id in reference.node_ids() {
            let (ex, ey) = exact(&reference, id, options.gravitational_constant);
            let got = state.forces[&id];
            assert!((got.x - ex).abs() < 1e-6, "fx mismatch for {id:?}");
            assert!((got.y - ey).abs() < 1e-6, "fy mismatch for {id:?}");
        }
    }

    #[test]
    fn zero_mass_node_feels_and_exerts_nothing() {
        let mut graph = GraphView::new();
        graph.add_node(PhysicsNode::new(NodeId(1), 0.0, 0.0));
        graph.add_node(PhysicsNode::new(NodeId(2), 10.0, 0.0).with_mass(0.0));
        graph.add_node(PhysicsNode::new(NodeId(3), 20.0, 0.0));
        let state = solve(&mut graph, PhysicsOptions::barnes_hut());
        assert_eq!(state.forces[&NodeId(2)].x, 0.0);
        // Node 1 only sees node 3 at distance 20.
        let g = PhysicsOptions::barnes_hut().gravitational_constant;
        let expected = g / (20.0 * 20.0 * 20.0) * 20.0;
        assert!((state.forces[&NodeId(1)].x - expected).abs() < 1e-9);
    }

    #[test]
    fn overlap_avoidance_strengthens_close_range_repulsion() {
        let base = solve(&mut two_node_graph(10.0), PhysicsOptions::barnes_hut());
        let mut options = PhysicsOptions::barnes_hut();
        options.avoid_overlap = 1.0;
        let mut graph = two_node_graph(10.0);
        for id in [NodeId(1), NodeId(2)] {
            graph.node_mut(id).unwrap().radius = 8.0;
        }
        let avoided = solve(&mut graph, options);
        // Shrinking the effective distance grows the force magnitude.
        assert!(avoided.forces[&NodeId(2)].x > base.forces[&NodeId(2)].x);
    }
}
