//! The force solver family.
//!
//! One implementation per force model; the driver picks three (gravity,
//! repulsion, springs) at configuration time and runs them in that fixed
//! order each step.

mod barnes_hut;
mod central_gravity;
mod forceatlas2;
mod hierarchical_repulsion;
mod hierarchical_spring;
mod spring;

pub use barnes_hut::BarnesHutSolver;
pub use central_gravity::CentralGravitySolver;
pub use forceatlas2::{ForceAtlas2CentralGravity, ForceAtlas2Repulsion};
pub use hierarchical_repulsion::HierarchicalRepulsionSolver;
pub use hierarchical_spring::HierarchicalSpringSolver;
pub use spring::SpringSolver;
