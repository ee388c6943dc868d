//! View frustum extraction and box visibility

use crate::foundation::math::{Mat4, Vec3, Vec4};
use crate::scene::bounds::Aabb;

/// Plane defined by normal and signed distance from origin
///
/// Points with a positive signed distance lie on the inner side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal pointing into the frustum
    pub normal: Vec3,
    /// Signed distance term
    pub distance: f32,
}

impl Plane {
    /// Create a new plane, normalizing the equation by the normal's length
    pub fn new(normal: Vec3, distance: f32) -> Self {
        let length = normal.norm();
        if length > 0.0 {
            Self { normal: normal / length, distance: distance / length }
        } else {
            Self { normal, distance }
        }
    }

    fn from_coefficients(v: Vec4) -> Self {
        Self::new(Vec3::new(v.x, v.y, v.z), v.w)
    }

    /// Signed distance from plane to point
    pub fn distance_to_point(&self, point: &Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }
}

/// Six clipping planes in the order left, right, bottom, top, near, far
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Inward-facing planes
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Create a frustum from six planes
    pub fn new(planes: [Plane; 6]) -> Self {
        Self { planes }
    }

    /// Extract the planes of a combined projection * view matrix
    ///
    /// Gribb-Hartmann: each plane is the last row plus or minus one of the
    /// first three rows.
    pub fn from_view_projection(view_projection: &Mat4) -> Self {
        let row = |i: usize| -> Vec4 { view_projection.row(i).transpose() };
        let (r0, r1, r2, r3) = (row(0), row(1), row(2), row(3));

        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r3 + r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Conservative box test: `false` only when the box lies entirely behind one plane
    pub fn is_box_visible(&self, min: &Vec3, max: &Vec3) -> bool {
        let center = (min + max) * 0.5;
        let half_extent = (max - min) * 0.5;

        self.planes.iter().all(|plane| {
            let radius = plane.normal.abs().dot(&half_extent);
            plane.distance_to_point(&center) + radius >= 0.0
        })
    }

    /// [`Frustum::is_box_visible`] for an [`Aabb`]; empty boxes are never visible
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        !aabb.is_empty() && self.is_box_visible(&aabb.min, &aabb.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{utils::deg_to_rad, Mat4Ext};
    use approx::assert_relative_eq;

    fn camera_frustum() -> Frustum {
        let projection = Mat4::perspective_vulkan(deg_to_rad(90.0), 1.0, 0.1, 100.0);
        let view = Mat4::look_at(Vec3::zeros(), Vec3::new(0.0, 0.0, -1.0), Vec3::y());
        Frustum::from_view_projection(&(projection * view))
    }

    fn cube_at(center: Vec3) -> Aabb {
        Aabb::from_center_extents(center, Vec3::new(0.5, 0.5, 0.5))
    }

    #[test]
    fn test_planes_are_normalized() {
        for plane in camera_frustum().planes.iter() {
            assert_relative_eq!(plane.normal.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn test_box_inside_is_visible() {
        let frustum = camera_frustum();
        assert!(frustum.intersects_aabb(&cube_at(Vec3::new(0.0, 0.0, -10.0))));
        assert!(frustum.intersects_aabb(&cube_at(Vec3::new(4.0, -4.0, -10.0))));
    }

    #[test]
    fn test_box_straddling_plane_is_visible() {
        let frustum = camera_frustum();
        // Centered on the left plane x = z
        assert!(frustum.intersects_aabb(&cube_at(Vec3::new(-10.0, 0.0, -10.0))));
    }

    #[test]
    fn test_box_outside_one_plane_is_culled() {
        let frustum = camera_frustum();
        assert!(!frustum.intersects_aabb(&cube_at(Vec3::new(-50.0, 0.0, -10.0))));
        assert!(!frustum.intersects_aabb(&cube_at(Vec3::new(0.0, 50.0, -10.0))));
        assert!(!frustum.intersects_aabb(&cube_at(Vec3::new(0.0, 0.0, 10.0))));
    }

    #[test]
    fn test_box_beyond_far_plane_is_culled() {
        let frustum = camera_frustum();
        let mut cube = cube_at(Vec3::new(0.0, 0.0, -10.0));
        assert!(frustum.intersects_aabb(&cube));

        let offset = Vec3::new(0.0, 0.0, -500.0);
        cube = Aabb::new(cube.min + offset, cube.max + offset);
        assert!(!frustum.intersects_aabb(&cube));
    }

    #[test]
    fn test_empty_box_is_not_visible() {
        assert!(!camera_frustum().intersects_aabb(&Aabb::empty()));
    }
}
