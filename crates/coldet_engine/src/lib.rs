//! # Coldet Engine
//!
//! Exact collision detection between rigid triangle meshes.
//!
//! ## Features
//!
//! - **Box Trees**: Each model builds a bounding volume hierarchy over its triangles
//! - **Oriented Box Culling**: Node pairs are rejected with a separating axis test
//! - **Exact Triangle Tests**: Möller's triangle/triangle test, including coplanar cases
//! - **Model Sets**: A keyed collision system with sphere and root box pre-tests
//!
//! ## Quick Start
//!
//! ```rust
//! use coldet_engine::prelude::*;
//!
//! fn square() -> CollisionModel {
//!     let mut builder = CollisionModelBuilder::new(false, Some(2));
//!     let corner = |x: f64, y: f64| Vec3::new(x, y, 0.0);
//!     builder
//!         .add_triangle(corner(-1.0, -1.0), corner(1.0, -1.0), corner(1.0, 1.0))
//!         .add_triangle(corner(-1.0, -1.0), corner(1.0, 1.0), corner(-1.0, 1.0));
//!     builder.finish()
//! }
//!
//! let floor = square();
//! let mut wall = square();
//! wall.set_transform(RigidTransform::from_position_euler_degrees(
//!     Vec3::new(0.0, 0.0, 0.5),
//!     90.0,
//!     0.0,
//!     0.0,
//! ));
//!
//! let hit = floor.collision(&wall, None).expect("wall crosses the floor");
//! let (_floor_triangle, _wall_triangle) = hit.triangles(Space::World);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::many_single_char_names)]

// Core engine modules
pub mod core;

pub mod config;
pub mod foundation;
pub mod physics;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{ColdetConfig, Config, ConfigError, ConfigFormat},
        foundation::math::{MathError, Mat4, Quat, RigidTransform, Vec3},
        physics::{
            Collision, CollisionModel, CollisionModelBuilder, CollisionPair, MeshCollisionSystem,
            MeshError, ModelCollision, ModelKey, QueryStats, Space, Triangle,
        },
        spatial::SplitHeuristic,
    };
}
