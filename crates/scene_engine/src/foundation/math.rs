//! Math utilities and types
//!
//! Provides the fundamental math types used by the scene tree, the culler and
//! the per-instance GPU data.

pub use nalgebra::{
    Vector3, Vector4,
    Matrix3, Matrix4,
    Quaternion,
    Unit, UnitQuaternion,
};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 3x3 matrix type
pub type Mat3 = Matrix3<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Quaternion type for rotations
pub type Quat = UnitQuaternion<f32>;

/// Build a unit quaternion from components stored as `(x, y, z, w)`
///
/// Scene documents store rotations in this order; nalgebra's constructor
/// takes `w` first.
pub fn quat_from_xyzw(x: f32, y: f32, z: f32, w: f32) -> Quat {
    Quat::new_normalize(Quaternion::new(w, x, y, z))
}

/// Return the `(x, y, z, w)` components of a unit quaternion
#[cfg(test)]
pub fn quat_to_xyzw(q: &Quat) -> [f32; 4] {
    [q.i, q.j, q.k, q.w]
}

/// Local translation / rotation / scale of a scene node
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalTransform {
    /// Translation relative to the parent node
    pub translation: Vec3,

    /// Rotation relative to the parent node
    pub rotation: Quat,

    /// Per-axis scale factors
    pub scale: Vec3,
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::zeros(),
            rotation: Quat::identity(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl LocalTransform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from all three components
    pub fn new(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self { translation, rotation, scale }
    }

    /// Create a transform with only a translation
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Default::default()
        }
    }

    /// Convert to a transformation matrix
    ///
    /// Composition is `T * R * S`, applied right-to-left to column vectors.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translation)
            * self.rotation.to_homogeneous()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }
}

/// Inverse-transpose of a model matrix, used to transform normals
///
/// Singular matrices (e.g. a zero scale) yield the identity.
pub fn normal_matrix(model: &Mat4) -> Mat4 {
    model
        .try_inverse()
        .map(|inverse| inverse.transpose())
        .unwrap_or_else(Mat4::identity)
}

/// Convert a matrix into the column-major array layout shaders expect
pub fn to_cols_array(m: &Mat4) -> [[f32; 4]; 4] {
    let mut out = [[0.0; 4]; 4];
    for (col, column) in out.iter_mut().enumerate() {
        for (row, value) in column.iter_mut().enumerate() {
            *value = m[(row, col)];
        }
    }
    out
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::*;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Component-wise linear interpolation between two vectors
    pub fn mix(a: &Vec3, b: &Vec3, t: f32) -> Vec3 {
        Vec3::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t), lerp(a.z, b.z, t))
    }

    /// Spherical linear interpolation along the shortest arc
    ///
    /// Falls back to normalized linear interpolation when the two rotations
    /// are too close for slerp to be well conditioned.
    pub fn slerp(a: &Quat, b: &Quat, t: f32) -> Quat {
        let mut end = *b.quaternion();
        if a.quaternion().dot(&end) < 0.0 {
            end = -end;
        }
        let end = Quat::new_unchecked(end);
        a.try_slerp(&end, t, 1.0e-6)
            .unwrap_or_else(|| Quat::new_normalize(a.quaternion().lerp(end.quaternion(), t)))
    }
}

/// Extension trait for Mat4 with projection helpers
pub trait Mat4Ext {
    /// Right-handed perspective with zero-to-one depth and Vulkan's Y-down clip space
    fn perspective_vulkan(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn perspective_vulkan(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        let focal = 1.0 / (fov_y * 0.5).tan();

        let mut result = Mat4::zeros();
        result[(0, 0)] = focal / aspect;
        result[(1, 1)] = -focal; // Vulkan clip space Y points down
        result[(2, 2)] = far / (near - far);
        result[(2, 3)] = (near * far) / (near - far);
        result[(3, 2)] = -1.0;
        result
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }
}
