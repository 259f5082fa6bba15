//! Triangle primitive stored by collision models

use crate::foundation::math::{Mat4, Mat4Ext, Vec3};
use super::tri_tri;

/// A triangle with a precomputed centroid
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// First corner
    pub v1: Vec3,
    /// Second corner
    pub v2: Vec3,
    /// Third corner
    pub v3: Vec3,
    centroid: Vec3,
}

impl Triangle {
    /// Creates a new triangle
    pub fn new(v1: Vec3, v2: Vec3, v3: Vec3) -> Self {
        Self {
            v1,
            v2,
            v3,
            centroid: (v1 + v2 + v3) / 3.0,
        }
    }

    /// Centroid (average of the three corners)
    pub fn centroid(&self) -> Vec3 {
        self.centroid
    }

    /// Corners as an array
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.v1, self.v2, self.v3]
    }

    /// Unnormalized plane normal (right-hand rule)
    pub fn normal(&self) -> Vec3 {
        (self.v2 - self.v1).cross(&(self.v3 - self.v1))
    }

    /// Component-wise minimum and maximum of the corners
    pub fn extents(&self) -> (Vec3, Vec3) {
        (
            self.v1.inf(&self.v2).inf(&self.v3),
            self.v1.sup(&self.v2).sup(&self.v3),
        )
    }

    /// Copy of this triangle with every corner mapped through `matrix`
    pub fn transformed(&self, matrix: &Mat4) -> Triangle {
        Triangle::new(
            matrix.transform_position(&self.v1),
            matrix.transform_position(&self.v2),
            matrix.transform_position(&self.v3),
        )
    }

    /// Exact triangle/triangle intersection (Möller 1997)
    pub fn intersects(&self, other: &Triangle) -> bool {
        tri_tri::triangles_intersect(
            [self.v1, self.v2, self.v3],
            [other.v1, other.v2, other.v3],
        )
    }
}
