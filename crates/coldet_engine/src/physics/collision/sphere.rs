//! Bounding sphere used as a cheap pre-test before box tree traversal

use crate::foundation::math::{RigidTransform, Vec3};
use super::triangle::Triangle;

/// A sphere in a model's own frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// The center position of the sphere
    pub center: Vec3,
    /// The radius of the sphere
    pub radius: f64,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Sphere centered on `center` that reaches every corner of `triangles`
    pub fn enclosing<'a, I>(center: Vec3, triangles: I) -> Self
    where
        I: IntoIterator<Item = &'a Triangle>,
    {
        let radius_squared = triangles
            .into_iter()
            .flat_map(|t| t.vertices())
            .map(|v| (v - center).magnitude_squared())
            .fold(0.0_f64, f64::max);
        Self::new(center, radius_squared.sqrt())
    }

    /// Same sphere with its center moved by `transform`
    pub fn transformed(&self, transform: &RigidTransform) -> Self {
        Self::new(transform.transform_point(&self.center), self.radius)
    }

    /// Check if this sphere intersects with another; touching counts
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_squared = (self.center - other.center).magnitude_squared();
        let radius_sum = self.radius + other.radius;
        distance_squared <= radius_sum * radius_sum
    }
}
