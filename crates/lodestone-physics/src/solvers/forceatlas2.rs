//! ForceAtlas2-based variants.
//!
//! Both differ from their plain counterparts by weighting forces with the
//! node degree, which keeps hubs from collapsing into their neighborhoods.

use crate::options::{PhysicsOptions, PhysicsOptionsPatch};
use crate::rng::SolverRng;
use crate::solver::{PhysicsState, Solver};
use crate::tree::BarnesHutTree;
use lodestone_core::GraphView;

const RNG_LABEL: &str = "forceatlas2-repulsion-solver";

/// ForceAtlas2 repulsion over the same quadtree walk as the Barnes-Hut
/// solver, with a squared (not cubed) distance denominator and a
/// `(degree + 1)` weight. The zero-distance fallback draws from this
/// solver's own random stream instead of a fixed nominal value.
pub struct ForceAtlas2Repulsion {
    options: PhysicsOptions,
    rng: SolverRng,
}

impl ForceAtlas2Repulsion {
    pub fn new(options: &PhysicsOptions) -> Self {
        Self {
            options: options.clone(),
            rng: SolverRng::new(options.random_seed, RNG_LABEL),
        }
    }
}

impl Solver for ForceAtlas2Repulsion {
    fn solve(&mut self, graph: &mut GraphView, state: &mut PhysicsState) {
        let tree = BarnesHutTree::build(graph, &state.node_ids, &mut self.rng);
        if tree.is_empty() {
            return;
        }
        let theta_inverted = 1.0 / self.options.theta;
        let g = self.options.gravitational_constant;
        let rng = &mut self.rng;

        for i in 0..state.node_ids.len() {
            let id = state.node_ids[i];
            let Some(node) = graph.node(id) else { continue };
            if !node.is_massive() {
                continue;
            }
            let (x, y, mass) = (node.x, node.y, node.mass);
            let degree_factor = (graph.degree(id) + 1) as f64;
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
                    distance = 0.1 * rng.unit();
                    dx = distance;
                }
                let gravity_force = g * degree_factor * branch_mass * mass / (distance * distance);
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

/// ForceAtlas2 central gravity: `centralGravity * (degree + 1) * mass`
/// scaling the raw offset, with no distance normalization. At the exact
/// origin it computes nothing at all, leaving the force entry as the
/// reset left it. That asymmetry with the plain solver is intentional and
/// pinned by tests.
pub struct ForceAtlas2CentralGravity {
    options: PhysicsOptions,
}

impl ForceAtlas2CentralGravity {
    pub fn new(options: &PhysicsOptions) -> Self {
        Self {
            options: options.clone(),
        }
    }
}

impl Solver for ForceAtlas2CentralGravity {
    fn solve(&mut self, graph: &mut GraphView, state: &mut PhysicsState) {
        let central_gravity = self.options.central_gravity;
        for i in 0..state.node_ids.len() {
            let id = state.node_ids[i];
            let Some(node) = graph.node(id) else { continue };
            let dx = -node.x;
            let dy = -node.y;
            let distance = (dx * dx + dy * dy).sqrt();
            if distance > 0.0 {
                let degree_factor = (graph.degree(id) + 1) as f64;
                let gravity_force = central_gravity * degree_factor * node.mass;
                state.add_force(id, dx * gravity_force, dy * gravity_force);
            }
        }
    }

    fn apply_patch(&mut self, patch: &PhysicsOptionsPatch) {
        self.options.apply(patch);
    }
}
