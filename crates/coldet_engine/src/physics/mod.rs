//! Physics module for collision detection
//!
//! Exact triangle-mesh collision between models organized in box trees,
//! plus a collision system that manages many placed models.

pub mod collision;
pub mod collision_system;

pub use collision::{
    BoundingBox,
    BoundingSphere,
    Collision,
    CollisionModel,
    CollisionModelBuilder,
    CollisionPair,
    MeshError,
    QueryStats,
    Space,
    Triangle,
};
pub use collision_system::{MeshCollisionSystem, ModelCollision, ModelKey};
