//! Error types for the simulation core.
//!
//! Numerical degeneracy (zero distances, overlapping nodes, zero-area
//! bounds) is handled inline by the solvers and is never an error. The
//! variants here cover structural misuse only; running out of stabilization
//! iterations is reported through
//! [`StabilizationOutcome`](crate::StabilizationOutcome), not here.

use lodestone_core::NodeId;
use thiserror::Error;

/// Errors that can occur when driving the simulation.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// The driver was handed a graph with no nodes.
    #[error("graph has no nodes")]
    EmptyGraph,

    /// A node referenced by id was not found in the graph view.
    #[error("node not found: {0:?}")]
    NodeNotFound(NodeId),
}
