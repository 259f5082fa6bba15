//! Math utilities and types
//!
//! Fixed-size, stack-allocated vector and matrix types plus the rigid
//! transform used to place collision models in a shared reference frame.
//! All matrices follow the column-vector convention: `p' = M * p`, with the
//! translation stored in the fourth column.

pub use nalgebra::{
    Vector3,
    Matrix3, Matrix4,
    Quaternion,
    Unit,
};

/// 3D vector type
pub type Vec3 = Vector3<f64>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f64>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f64>;

/// Quaternion type for rotations
pub type Quat = Unit<Quaternion<f64>>;

/// Tolerance used when checking that a matrix has an affine bottom row.
const AFFINE_TOLERANCE: f64 = 1.0e-6;

/// Errors produced when validating transforms
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq)]
pub enum MathError {
    /// The matrix has no inverse
    #[error("matrix is singular (determinant {0})")]
    Singular(f64),

    /// The bottom row is not `[0 0 0 1]`
    #[error("matrix is not affine: bottom row is {0:?}")]
    NotAffine([f64; 4]),
}

/// Extension trait for Mat4 with the adjugate-based inverse
pub trait Mat4Ext {
    /// Determinant of the 3x3 matrix left after removing `row` and `col`
    fn minor(&self, row: usize, col: usize) -> f64;

    /// Transpose of the cofactor matrix
    fn adjugate(&self) -> Mat4;

    /// Inverse computed as `adjugate / determinant`, `None` when singular
    fn adjugate_inverse(&self) -> Option<Mat4>;

    /// Upper-left 3x3 block
    fn rotation_part(&self) -> Mat3;

    /// Fourth column without the homogeneous component
    fn translation_part(&self) -> Vec3;

    /// Transform a position, ignoring the projective row
    fn transform_position(&self, point: &Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn minor(&self, row: usize, col: usize) -> f64 {
        self.remove_row(row).remove_column(col).determinant()
    }

    fn adjugate(&self) -> Mat4 {
        Mat4::from_fn(|i, j| {
            // adj(M)[i][j] is the (j, i) cofactor
            let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
            sign * self.minor(j, i)
        })
    }

    fn adjugate_inverse(&self) -> Option<Mat4> {
        let determinant = self.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            return None;
        }
        Some(self.adjugate() / determinant)
    }

    fn rotation_part(&self) -> Mat3 {
        self.fixed_view::<3, 3>(0, 0).into_owned()
    }

    fn translation_part(&self) -> Vec3 {
        Vec3::new(self.m14, self.m24, self.m34)
    }

    fn transform_position(&self, point: &Vec3) -> Vec3 {
        self.rotation_part() * point + self.translation_part()
    }
}

/// Rigid (rotation + translation) transform from model space to world space
///
/// The wrapped matrix is guaranteed to be affine and invertible, so
/// [`RigidTransform::inverse`] cannot fail.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    matrix: Mat4,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl RigidTransform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self { matrix: Mat4::identity() }
    }

    /// Create a transform with only a translation
    pub fn from_translation(position: Vec3) -> Self {
        Self { matrix: Mat4::new_translation(&position) }
    }

    /// Create a transform with position and rotation
    pub fn from_position_rotation(position: Vec3, rotation: Quat) -> Self {
        Self {
            matrix: Mat4::new_translation(&position) * rotation.to_homogeneous(),
        }
    }

    /// Create a transform from Euler angles in degrees and a position
    pub fn from_position_euler_degrees(position: Vec3, roll: f64, pitch: f64, yaw: f64) -> Self {
        let rotation = Quat::from_euler_angles(
            utils::deg_to_rad(roll),
            utils::deg_to_rad(pitch),
            utils::deg_to_rad(yaw),
        );
        Self::from_position_rotation(position, rotation)
    }

    /// Validate and wrap an arbitrary 4x4 matrix
    ///
    /// Scaling is not detected; callers are expected to supply rigid motions.
    pub fn from_matrix(matrix: Mat4) -> Result<Self, MathError> {
        let bottom = [matrix.m41, matrix.m42, matrix.m43, matrix.m44];
        let expected = [0.0, 0.0, 0.0, 1.0];
        if bottom
            .iter()
            .zip(expected.iter())
            .any(|(value, wanted)| (value - wanted).abs() > AFFINE_TOLERANCE)
        {
            log::debug!("Rejected transform with bottom row {bottom:?}");
            return Err(MathError::NotAffine(bottom));
        }

        let determinant = matrix.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            log::debug!("Rejected singular transform (determinant {determinant})");
            return Err(MathError::Singular(determinant));
        }

        Ok(Self { matrix })
    }

    /// Build from 16 values in row-major order
    pub fn from_row_slice(values: &[f64; 16]) -> Result<Self, MathError> {
        Self::from_matrix(Mat4::from_row_slice(values))
    }

    /// The wrapped matrix
    pub fn matrix(&self) -> &Mat4 {
        &self.matrix
    }

    /// Rotation block
    pub fn rotation(&self) -> Mat3 {
        self.matrix.rotation_part()
    }

    /// Translation column
    pub fn translation(&self) -> Vec3 {
        self.matrix.translation_part()
    }

    /// Inverse via adjugate and determinant
    ///
    /// Falls back to the rigid closed form `[R^T | -R^T t]` when the
    /// adjugate determinant underflows on recomputation.
    pub fn inverse(&self) -> RigidTransform {
        if let Some(matrix) = self.matrix.adjugate_inverse() {
            return Self { matrix };
        }
        log::warn!("Adjugate inverse failed for a validated transform, using R^T");
        Self { matrix: self.rigid_inverse() }
    }

    /// Inverse of a pure rotation and translation, exact without division
    fn rigid_inverse(&self) -> Mat4 {
        let rotation_t = self.rotation().transpose();
        let translation = -(rotation_t * self.translation());
        let mut matrix = rotation_t.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        matrix
    }

    /// Apply `self` after `first`: the result maps through `first`, then `self`
    pub fn compose(&self, first: &RigidTransform) -> RigidTransform {
        Self { matrix: self.matrix * first.matrix }
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: &Vec3) -> Vec3 {
        self.matrix.transform_position(point)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f64 = std::f64::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f64 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f64) -> f64 {
        degrees * constants::DEG_TO_RAD
    }

    /// Index of the component with the largest absolute value
    ///
    /// Ties resolve towards the lower index.
    pub fn dominant_axis(v: &super::Vec3) -> usize {
        let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
        if ax >= ay && ax >= az {
            0
        } else if ay >= az {
            1
        } else {
            2
        }
    }
}
