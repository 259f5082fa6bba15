//! Spatial partitioning data structures
//!
//! Bounding volume hierarchies that let collision queries discard large
//! groups of triangles with a single box test.

pub mod box_tree;

pub use box_tree::{BoxTree, Node, SplitHeuristic, TreeStats};
