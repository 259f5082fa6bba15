//! Triangle-mesh collision detection
//!
//! Models are stored in model space and never rewritten when they move.
//! A query brings the other model into the queried model's frame with one
//! relative transform and tests geometry there.
//!
//! # Module Organization
//!
//! - [`triangle`] and [`tri_tri`] - Triangle primitive and exact intersection test
//! - [`bounding_box`] - Node boxes and the oriented box overlap test
//! - [`sphere`] - Bounding sphere pre-test
//! - [`model`] - Model builder, finished models and the dual-tree query

pub mod bounding_box;
pub mod model;
pub mod sphere;
pub mod tri_tri;
pub mod triangle;

pub use bounding_box::BoundingBox;
pub use model::{
    Collision, CollisionModel, CollisionModelBuilder, CollisionPair, MeshError, QueryStats, Space,
    DEFAULT_MIN_QUEUE_CAPACITY,
};
pub use sphere::BoundingSphere;
pub use triangle::Triangle;
