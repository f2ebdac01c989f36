//! Simulation configuration.
//!
//! [`PhysicsOptions`] is the concrete configuration the driver and solvers
//! run with; [`PhysicsOptionsPatch`] is the flat, partially-populated update
//! shape accepted by `set_options`: fields left out of a patch keep their
//! prior values, and unrecognized JSON keys are ignored on deserialization.

use serde::{Deserialize, Serialize};

/// Which solver family drives repulsion (and, for the hierarchical model,
/// the spring pass). Selected once at configuration time; the step loop
/// never inspects the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SolverModel {
    /// Barnes-Hut tree-approximated repulsion with plain central gravity
    /// and Hooke springs.
    #[default]
    BarnesHut,
    /// ForceAtlas2-based repulsion and degree-weighted central gravity.
    ForceAtlas2Based,
    /// Exact pairwise same-level repulsion with the energy-balanced
    /// hierarchical spring solver. Used when hierarchical layout is active.
    HierarchicalRepulsion,
}

/// Tuning knobs for the simulation. Defaults follow the solver model; see
/// the per-model constructors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhysicsOptions {
    /// Active solver family.
    pub solver: SolverModel,
    /// Barnes-Hut accuracy knob: a branch is treated as a single point mass
    /// when `distance * (1 / branch_size) > 1 / theta`. Smaller is more
    /// accurate and slower.
    pub theta: f64,
    /// Repulsion strength. Negative pushes nodes apart.
    pub gravitational_constant: f64,
    /// Pull toward the origin keeping the graph centered.
    pub central_gravity: f64,
    /// Spring rest length used when an edge carries no override.
    pub spring_length: f64,
    /// Hooke spring constant.
    pub spring_constant: f64,
    /// Target minimum separation for hierarchical repulsion.
    pub node_distance: f64,
    /// Overlap avoidance in `[0, 1]`: shrinks the effective repulsion
    /// distance by up to half the node radius so touching nodes do not sit
    /// on a force singularity. Values outside the range are clamped.
    pub avoid_overlap: f64,
    /// Velocity damping coefficient, applied as a drag force.
    pub damping: f64,
    /// Integration time step.
    pub timestep: f64,
    /// Per-axis velocity clamp.
    pub max_velocity: f64,
    /// Stabilization threshold: the layout is stable once the fastest node
    /// moves slower than this.
    pub min_velocity: f64,
    /// Seed for the per-solver jitter streams. Identical seeds reproduce
    /// identical layouts for identical input.
    pub random_seed: u64,
}

impl Default for PhysicsOptions {
    fn default() -> Self {
        Self::barnes_hut()
    }
}

impl PhysicsOptions {
    /// Barnes-Hut defaults.
    pub fn barnes_hut() -> Self {
        Self {
            solver: SolverModel::BarnesHut,
            theta: 0.5,
            gravitational_constant: -2000.0,
            central_gravity: 0.3,
            spring_length: 95.0,
            spring_constant: 0.04,
            node_distance: 120.0,
            avoid_overlap: 0.0,
            damping: 0.09,
            timestep: 0.5,
            max_velocity: 50.0,
            min_velocity: 0.75,
            random_seed: 42,
        }
    }

    /// ForceAtlas2-based defaults: weaker constant, degree-weighted forces.
    pub fn force_atlas2() -> Self {
        Self {
            solver: SolverModel::ForceAtlas2Based,
            gravitational_constant: -50.0,
            central_gravity: 0.01,
            spring_length: 100.0,
            spring_constant: 0.08,
            ..Self::barnes_hut()
        }
    }

    /// Hierarchical defaults: no central pull, soft springs, pairwise
    /// same-level repulsion.
    pub fn hierarchical() -> Self {
        Self {
            solver: SolverModel::HierarchicalRepulsion,
            central_gravity: 0.0,
            spring_length: 100.0,
            spring_constant: 0.01,
            ..Self::barnes_hut()
        }
    }

    /// Overlap-avoidance factor clamped to `[0, 1]`.
    pub fn overlap_avoidance_factor(&self) -> f64 {
        self.avoid_overlap.clamp(0.0, 1.0)
    }

    /// Fold a patch into these options. Absent fields keep prior values.
    pub fn apply(&mut self, patch: &PhysicsOptionsPatch) {
        if let Some(v) = patch.solver {
            self.solver = v;
        }
        if let Some(v) = patch.theta {
            self.theta = v;
        }
        if let Some(v) = patch.gravitational_constant {
            self.gravitational_constant = v;
        }
        if let Some(v) = patch.central_gravity {
            self.central_gravity = v;
        }
        if let Some(v) = patch.spring_length {
            self.spring_length = v;
        }
        if let Some(v) = patch.spring_constant {
            self.spring_constant = v;
        }
        if let Some(v) = patch.node_distance {
            self.node_distance = v;
        }
        if let Some(v) = patch.avoid_overlap {
            self.avoid_overlap = v;
        }
        if let Some(v) = patch.damping {
            self.damping = v;
        }
        if let Some(v) = patch.timestep {
            self.timestep = v;
        }
        if let Some(v) = patch.max_velocity {
            self.max_velocity = v;
        }
        if let Some(v) = patch.min_velocity {
            self.min_velocity = v;
        }
        if let Some(v) = patch.random_seed {
            self.random_seed = v;
        }
    }
}

/// Partial options update. Every field is optional; `Default` is the empty
/// patch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicsOptionsPatch {
    pub solver: Option<SolverModel>,
    pub theta: Option<f64>,
    pub gravitational_constant: Option<f64>,
    pub central_gravity: Option<f64>,
    pub spring_length: Option<f64>,
    pub spring_constant: Option<f64>,
    pub node_distance: Option<f64>,
    pub avoid_overlap: Option<f64>,
    pub damping: Option<f64>,
    pub timestep: Option<f64>,
    pub max_velocity: Option<f64>,
    pub min_velocity: Option<f64>,
    pub random_seed: Option<u64>,
}

impl PhysicsOptionsPatch {
    /// A patch setting only the spring configuration.
    pub fn springs(length: f64, constant: f64) -> Self {
        Self {
            spring_length: Some(length),
            spring_constant: Some(constant),
            ..Self::default()
        }
    }
}
