//! Axis-aligned boxes and the oriented box overlap test
//!
//! Boxes are stored axis-aligned in their model's own frame. During a query
//! the second box is brought into the first box's frame by a rotation and a
//! translation, which turns the pair into a general oriented-box test.

use crate::foundation::math::{Mat3, RigidTransform, Vec3};
use super::triangle::Triangle;

/// Half-width added on each side of an axis along which a box has no extent.
pub const FLAT_AXIS_EPSILON: f64 = 0.001;

/// Axis-aligned box given by its minimum corner and its size
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    position: Vec3,
    size: Vec3,
    center: Vec3,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }
}

impl BoundingBox {
    /// Create from corner position and size
    pub fn new(position: Vec3, size: Vec3) -> Self {
        Self {
            position,
            size,
            center: position + size * 0.5,
        }
    }

    /// Create from minimum and maximum corners
    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self::new(min, max - min)
    }

    /// Smallest box around the given triangles, `None` for an empty set
    ///
    /// Axes along which all vertices coincide are widened by
    /// [`FLAT_AXIS_EPSILON`] on both sides.
    pub fn around<'a, I>(triangles: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Triangle>,
    {
        let mut iter = triangles.into_iter();
        let (mut min, mut max) = iter.next()?.extents();
        for triangle in iter {
            let (lo, hi) = triangle.extents();
            min = min.inf(&lo);
            max = max.sup(&hi);
        }

        for axis in 0..3 {
            if min[axis] == max[axis] {
                min[axis] -= FLAT_AXIS_EPSILON;
                max[axis] += FLAT_AXIS_EPSILON;
            }
        }

        Some(Self::from_min_max(min, max))
    }

    /// Minimum corner
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Edge lengths
    pub fn size(&self) -> Vec3 {
        self.size
    }

    /// Center point
    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Maximum corner
    pub fn max(&self) -> Vec3 {
        self.position + self.size
    }

    /// Half of the edge lengths
    pub fn half_extents(&self) -> Vec3 {
        self.size * 0.5
    }

    /// Volume of the box
    pub fn volume(&self) -> f64 {
        self.size.x * self.size.y * self.size.z
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        let min = self.position;
        let max = self.max();
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        Self::from_min_max(self.position.inf(&other.position), self.max().sup(&other.max()))
    }

    /// Check if this box contains a point (boundary included)
    pub fn contains_point(&self, point: &Vec3) -> bool {
        let max = self.max();
        (0..3).all(|axis| point[axis] >= self.position[axis] && point[axis] <= max[axis])
    }

    /// Check if this box fully contains another box
    pub fn contains_box(&self, other: &BoundingBox) -> bool {
        self.contains_point(&other.position) && self.contains_point(&other.max())
    }

    /// Check overlap of two boxes in the same frame
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        (0..3).all(|axis| self.position[axis] <= b_max[axis] && a_max[axis] >= other.position[axis])
    }

    /// Axis-aligned box around this box after applying `transform`
    pub fn transformed(&self, transform: &RigidTransform) -> BoundingBox {
        let corners = self.corners().map(|corner| transform.transform_point(&corner));
        let (min, max) = corners[1..]
            .iter()
            .fold((corners[0], corners[0]), |(lo, hi), c| (lo.inf(c), hi.sup(c)));
        Self::from_min_max(min, max)
    }

    /// Oriented box overlap test (separating axis theorem)
    ///
    /// `rotation` and `translation` map `other`'s frame into this box's frame.
    /// Candidate axes are tried in the classical order: the three face
    /// normals of `self`, the three face normals of `other`, then the nine
    /// edge cross products. The first separating axis ends the test.
    pub fn overlaps(&self, other: &BoundingBox, rotation: &Mat3, translation: &Vec3) -> bool {
        let r = rotation;
        let abs_r = rotation.abs();
        let ea = self.half_extents();
        let eb = other.half_extents();

        // center of `other` relative to the center of `self`, in `self`'s frame
        let t = r * other.center + translation - self.center;

        // face normals of self
        for i in 0..3 {
            let rb = eb[0] * abs_r[(i, 0)] + eb[1] * abs_r[(i, 1)] + eb[2] * abs_r[(i, 2)];
            if t[i].abs() > ea[i] + rb {
                return false;
            }
        }

        // face normals of other
        for j in 0..3 {
            let distance = t[0] * r[(0, j)] + t[1] * r[(1, j)] + t[2] * r[(2, j)];
            let ra = ea[0] * abs_r[(0, j)] + ea[1] * abs_r[(1, j)] + ea[2] * abs_r[(2, j)];
            if distance.abs() > ra + eb[j] {
                return false;
            }
        }

        // cross products of self axis i with other axis j
        for i in 0..3 {
            let (i1, i2) = ((i + 1) % 3, (i + 2) % 3);
            for j in 0..3 {
                let (j1, j2) = ((j + 1) % 3, (j + 2) % 3);
                let distance = t[i2] * r[(i1, j)] - t[i1] * r[(i2, j)];
                let ra = ea[i1] * abs_r[(i2, j)] + ea[i2] * abs_r[(i1, j)];
                let rb = eb[j1] * abs_r[(i, j2)] + eb[j2] * abs_r[(i, j1)];
                if distance.abs() > ra + rb {
                    return false;
                }
            }
        }

        true
    }
}
