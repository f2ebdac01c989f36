//! Hierarchical level assignment.
//!
//! Assigns an integer level to every visible node of a graph, either from
//! its roots or from its leaves, with a cycle-tolerant fallback for graphs
//! that have no well-defined hierarchy. Levels seed the cross-axis
//! coordinate of tree and DAG layouts before (or instead of) physics.

mod levels;

pub use levels::{
    assign_levels_from_leaves, assign_levels_from_roots, level_views, LevelEdgeView, LevelNodeView,
};
