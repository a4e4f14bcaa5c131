//! Spatial partitioning data structures
//!
//! Provides bounding areas and the quad tree used to narrow drawables down
//! to the ones a camera can see.

mod bounds;
mod quad_tree;

pub use bounds::BoundingArea;
pub use quad_tree::{QuadTree, QuadTreeConfig, MAX_QUAD_TREE_DEPTH};
