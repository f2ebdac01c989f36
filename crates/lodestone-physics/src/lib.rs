//! Force-directed layout simulation core.
//!
//! This crate positions the nodes of an interactive graph by iterating a
//! 2-D point-mass simulation until it stabilizes. One step of the driver:
//!
//! ```text
//! ┌────────────┐   ┌──────────────┐   ┌───────────────────────────┐
//! │ GraphView  │──▶│ reset forces │──▶│ gravity → repulsion →     │
//! │ (nodes,    │   │ (one entry   │   │ springs (fixed order,     │
//! │  edges)    │   │  per node)   │   │ shared force accumulator) │
//! └────────────┘   └──────────────┘   └────────────┬──────────────┘
//!                                                  ▼
//!                                     ┌───────────────────────────┐
//!                                     │ integrate velocities /    │
//!                                     │ positions, check velocity │
//!                                     │ threshold                 │
//!                                     └───────────────────────────┘
//! ```
//!
//! The repulsion pass is approximated with a Barnes-Hut quadtree rebuilt
//! every step, turning the O(n²) pairwise sum into O(n log n). Three solver
//! families are available and selected once at configuration time:
//! Barnes-Hut (default), ForceAtlas2-based, and hierarchical (exact pairwise
//! repulsion restricted to same-level nodes, with an energy-balanced spring
//! pass).
//!
//! Degenerate geometry (zero distances, zero-area bounds, exactly
//! overlapping nodes) is handled inline with clamps, nominal minimum
//! distances, and seeded jitter; it never surfaces as an error.

mod error;
mod options;
mod rng;
mod simulation;
mod solver;
mod solvers;
mod tree;

pub use error::PhysicsError;
pub use options::{PhysicsOptions, PhysicsOptionsPatch, SolverModel};
pub use rng::SolverRng;
pub use simulation::{
    InterruptHandle, ProgressFn, Simulation, StabilizationOutcome, DEFAULT_MAX_ITERATIONS,
};
pub use solver::{Force, PhysicsState, Solver, Velocity};
pub use solvers::{
    BarnesHutSolver, CentralGravitySolver, ForceAtlas2CentralGravity, ForceAtlas2Repulsion,
    HierarchicalRepulsionSolver, HierarchicalSpringSolver, SpringSolver,
};
pub use tree::{BarnesHutTree, Branch, BranchIx, Occupancy};

/// Result type for simulation operations.
pub type Result<T> = std::result::Result<T, PhysicsError>;
