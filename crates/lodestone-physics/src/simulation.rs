//! The step and stabilization driver.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::PhysicsError;
use crate::options::{PhysicsOptions, PhysicsOptionsPatch, SolverModel};
use crate::solver::{PhysicsState, Solver};
use crate::solvers::{
    BarnesHutSolver, CentralGravitySolver, ForceAtlas2CentralGravity, ForceAtlas2Repulsion,
    HierarchicalRepulsionSolver, HierarchicalSpringSolver, SpringSolver,
};
use crate::Result;
use lodestone_core::{GraphView, NodeId};

/// Default iteration cap for [`Simulation::stabilize`].
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// Cancellation flag for a running stabilization loop. Clones share the
/// flag, so a handle can be moved to another thread and triggered there.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle {
    flag: Arc<AtomicBool>,
}

impl InterruptHandle {
    /// Request that the current stabilization loop stop after the step in
    /// flight.
    pub fn interrupt(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_interrupted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// How a stabilization run ended. Running out of iterations is reported
/// here, not as an error, so the caller can accept the partial layout or
/// run more iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilizationOutcome {
    /// Steps actually performed.
    pub iterations: usize,
    /// Whether the velocity threshold was reached.
    pub stabilized: bool,
}

/// Callback invoked during stabilization with `(iteration, max_speed)`.
pub type ProgressFn = Box<dyn FnMut(usize, f64) + Send>;

/// Owns the graph being laid out and drives it to a stable configuration.
///
/// One step: rebuild per-node state, run gravity, repulsion, and springs in
/// that order into the shared force accumulator, then integrate velocities
/// and positions. The solver trio is chosen once from the options and only
/// rebuilt when the model changes.
pub struct Simulation {
    graph: GraphView,
    state: PhysicsState,
    options: PhysicsOptions,
    gravity: Box<dyn Solver>,
    repulsion: Box<dyn Solver>,
    springs: Box<dyn Solver>,
    interrupt: InterruptHandle,
    progress: Option<ProgressFn>,
    progress_interval: usize,
    stabilized: bool,
}

impl Simulation {
    /// Create a simulation over `graph`. Fails on an empty graph; a layout
    /// of nothing is a caller bug, not a degenerate geometry case.
    pub fn new(graph: GraphView, options: PhysicsOptions) -> Result<Self> {
        if graph.node_count() == 0 {
            return Err(PhysicsError::EmptyGraph);
        }
        let (gravity, repulsion, springs) = build_solvers(&options);
        info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            solver = ?options.solver,
            "simulation initialized"
        );
        Ok(Self {
            graph,
            state: PhysicsState::default(),
            options,
            gravity,
            repulsion,
            springs,
            interrupt: InterruptHandle::default(),
            progress: None,
            progress_interval: 50,
            stabilized: false,
        })
    }

    pub fn graph(&self) -> &GraphView {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut GraphView {
        self.stabilized = false;
        &mut self.graph
    }

    pub fn options(&self) -> &PhysicsOptions {
        &self.options
    }

    pub fn is_stabilized(&self) -> bool {
        self.stabilized
    }

    /// Handle for stopping a stabilization loop from elsewhere.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.interrupt.clone()
    }

    /// Register a progress callback, invoked every `interval` iterations of
    /// a stabilization run.
    pub fn on_progress(&mut self, interval: usize, callback: ProgressFn) {
        self.progress_interval = interval.max(1);
        self.progress = Some(callback);
    }

    /// Apply a partial options update. Changing the solver model swaps the
    /// solver trio; otherwise the patch is forwarded to the active solvers.
    pub fn set_options(&mut self, patch: &PhysicsOptionsPatch) {
        let previous_model = self.options.solver;
        self.options.apply(patch);
        if self.options.solver != previous_model {
            let (gravity, repulsion, springs) = build_solvers(&self.options);
            self.gravity = gravity;
            self.repulsion = repulsion;
            self.springs = springs;
            debug!(solver = ?self.options.solver, "solver model changed");
        } else {
            self.gravity.apply_patch(patch);
            self.repulsion.apply_patch(patch);
            self.springs.apply_patch(patch);
        }
        self.stabilized = false;
    }

    /// Move a node, e.g. after a drag. Clears stabilization.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) -> Result<()> {
        let node = self
            .graph
            .node_mut(id)
            .ok_or(PhysicsError::NodeNotFound(id))?;
        node.x = x;
        node.y = y;
        self.stabilized = false;
        Ok(())
    }

    /// Perform one simulation step and return the maximum per-node speed.
    pub fn step(&mut self) -> f64 {
        self.state.rebuild(&self.graph);
        self.gravity.solve(&mut self.graph, &mut self.state);
        self.repulsion.solve(&mut self.graph, &mut self.state);
        self.springs.solve(&mut self.graph, &mut self.state);
        let max_speed = self.integrate();
        self.stabilized = max_speed < self.options.min_velocity;
        max_speed
    }

    /// Run steps until the fastest node drops below `min_velocity` or the
    /// cap is reached, whichever comes first.
    pub fn stabilize(&mut self, max_iterations: usize) -> StabilizationOutcome {
        self.interrupt.reset();
        let mut iterations = 0;
        while iterations < max_iterations {
            if self.interrupt.is_interrupted() {
                info!(iterations, "stabilization interrupted");
                break;
            }
            let max_speed = self.step();
            iterations += 1;
            if let Some(progress) = self.progress.as_mut() {
                if iterations % self.progress_interval == 0 {
                    progress(iterations, max_speed);
                }
            }
            if self.stabilized {
                info!(iterations, max_speed, "stabilization converged");
                break;
            }
        }
        if !self.stabilized && iterations == max_iterations {
            warn!(max_iterations, "stabilization ran out of iterations");
        }
        StabilizationOutcome {
            iterations,
            stabilized: self.stabilized,
        }
    }

    /// Velocity and position update. Damping enters as a drag force, and
    /// each axis is clamped to `max_velocity` independently. A pinned axis
    /// zeroes both its force and its velocity.
    fn integrate(&mut self) -> f64 {
        let damping = self.options.damping;
        let timestep = self.options.timestep;
        let max_velocity = self.options.max_velocity;
        let mut max_speed: f64 = 0.0;

        for i in 0..self.state.node_ids.len() {
            let id = self.state.node_ids[i];
            let force = self.state.forces.get(&id).copied().unwrap_or_default();
            let Some(velocity) = self.state.velocities.get_mut(&id) else {
                continue;
            };
            let Some(node) = self.graph.node_mut(id) else {
                continue;
            };
            if node.mass <= 0.0 {
                *velocity = Default::default();
                continue;
            }
            if node.fixed_x {
                velocity.x = 0.0;
            } else {
                let acceleration = (force.x - damping * velocity.x) / node.mass;
                velocity.x =
                    (velocity.x + acceleration * timestep).clamp(-max_velocity, max_velocity);
                node.x += velocity.x * timestep;
            }
            if node.fixed_y {
                velocity.y = 0.0;
            } else {
                let acceleration = (force.y - damping * velocity.y) / node.mass;
                velocity.y =
                    (velocity.y + acceleration * timestep).clamp(-max_velocity, max_velocity);
                node.y += velocity.y * timestep;
            }
            max_speed = max_speed.max(velocity.speed());
        }
        max_speed
    }
}

fn build_solvers(
    options: &PhysicsOptions,
) -> (Box<dyn Solver>, Box<dyn Solver>, Box<dyn Solver>) {
    match options.solver {
        SolverModel::BarnesHut => (
            Box::new(CentralGravitySolver::new(options)),
            Box::new(BarnesHutSolver::new(options)),
            Box::new(SpringSolver::new(options)),
        ),
        SolverModel::ForceAtlas2Based => (
            Box::new(ForceAtlas2CentralGravity::new(options)),
            Box::new(ForceAtlas2Repulsion::new(options)),
            Box::new(SpringSolver::new(options)),
        ),
        SolverModel::HierarchicalRepulsion => (
            Box::new(CentralGravitySolver::new(options)),
            Box::new(HierarchicalRepulsionSolver::new(options)),
            Box::new(HierarchicalSpringSolver::new(options)),
        ),
    }
}
