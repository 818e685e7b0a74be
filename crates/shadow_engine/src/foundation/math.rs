//! Math utilities and types
//!
//! Provides the vector/matrix aliases and the Euler-angle transform used by
//! drawables and shadow-casting lights.

use serde::{Deserialize, Serialize};

pub use nalgebra::{Matrix4, Rotation3, Unit, Vector3, Vector4};

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Coordinate axis used for rotations about a pivot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// World X axis
    X,
    /// World Y axis (vertical)
    Y,
    /// World Z axis
    Z,
}

/// Per-object translate / rotate / scale state
///
/// Rotation is stored as Euler angles in radians so animation code can bump a
/// single axis each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Translation in world space
    pub translate: Vec3,

    /// Euler rotation in radians (applied X, then Y, then Z)
    pub rotate: Vec3,

    /// Scale factors
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translate: Vec3::zeros(),
            rotate: Vec3::zeros(),
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }
}

impl Transform {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from its three components
    pub fn new(translate: Vec3, rotate: Vec3, scale: Vec3) -> Self {
        Self {
            translate,
            rotate,
            scale,
        }
    }

    /// Create a transform with only a translation
    pub fn from_translation(translate: Vec3) -> Self {
        Self {
            translate,
            ..Default::default()
        }
    }

    /// Builder pattern: set a uniform scale
    pub fn with_uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::new(scale, scale, scale);
        self
    }

    /// Builder pattern: set the Euler rotation (radians)
    pub fn with_rotation(mut self, rotate: Vec3) -> Self {
        self.rotate = rotate;
        self
    }

    /// Rotation part as a 4x4 matrix, `Rz * Ry * Rx`
    pub fn rotation_matrix(&self) -> Mat4 {
        Rotation3::from_euler_angles(self.rotate.x, self.rotate.y, self.rotate.z).to_homogeneous()
    }

    /// Model matrix in TRS order
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::new_translation(&self.translate)
            * self.rotation_matrix()
            * Mat4::new_nonuniform_scaling(&self.scale)
    }

    /// Apply this transform to a point
    pub fn transform_point(&self, point: Point3) -> Point3 {
        self.to_matrix().transform_point(&point)
    }
}

/// Rotate `point` about an axis-aligned line through `origin`
///
/// Positive angles rotate counter-clockwise when looking down the axis toward
/// the origin (right-handed).
pub fn rotate_about(point: Vec3, origin: Vec3, axis: Axis, angle: f32) -> Vec3 {
    let axis = match axis {
        Axis::X => Vec3::x_axis(),
        Axis::Y => Vec3::y_axis(),
        Axis::Z => Vec3::z_axis(),
    };
    let rotation = Rotation3::from_axis_angle(&axis, angle);
    rotation * (point - origin) + origin
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;

    /// Radians to degrees conversion factor
    pub const RAD_TO_DEG: f32 = 180.0 / PI;
}

/// Math utility functions
pub mod utils {
    use super::constants;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Convert radians to degrees
    pub fn rad_to_deg(radians: f32) -> f32 {
        radians * constants::RAD_TO_DEG
    }
}

/// Extension trait for Mat4 with view and projection constructors
pub trait Mat4Ext {
    /// Create a right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Create an orthographic projection (clip depth in [-1, 1])
    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4;

    /// Create a perspective projection (clip depth in [-1, 1])
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        let forward = (target - eye).normalize();
        let right = forward.cross(&up).normalize();
        let camera_up = right.cross(&forward);

        let translation = Mat4::new(
            1.0, 0.0, 0.0, -eye.x,
            0.0, 1.0, 0.0, -eye.y,
            0.0, 0.0, 1.0, -eye.z,
            0.0, 0.0, 0.0, 1.0,
        );

        let rotation = Mat4::new(
            right.x, right.y, right.z, 0.0,
            camera_up.x, camera_up.y, camera_up.z, 0.0,
            -forward.x, -forward.y, -forward.z, 0.0, // camera looks down -Z
            0.0, 0.0, 0.0, 1.0,
        );

        rotation * translation
    }

    fn orthographic(left: f32, right: f32, bottom: f32, top: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_orthographic(left, right, bottom, top, near, far)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_identity_transform_is_identity_matrix() {
        assert_relative_eq!(Transform::identity().to_matrix(), Mat4::identity(), epsilon = EPSILON);
    }

    #[test]
    fn test_trs_order() {
        let transform = Transform::new(
            Vec3::new(0.0, 0.0, 20.0),
            Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            Vec3::new(2.0, 2.0, 2.0),
        );

        // Scale first, then rotate +X onto -Z, then translate
        let moved = transform.transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(moved, Point3::new(0.0, 0.0, 18.0), epsilon = EPSILON);
    }

    #[test]
    fn test_with_rotation_keeps_translation_and_scale() {
        let base = Transform::from_translation(Vec3::new(0.0, 4.0, 0.0)).with_uniform_scale(3.0);
        let rotated = base.clone().with_rotation(Vec3::new(0.0, 0.0, std::f32::consts::FRAC_PI_2));

        assert_eq!(rotated.translate, base.translate);
        assert_eq!(rotated.scale, base.scale);
        // +X scales to 3 then turns onto +Y
        let moved = rotated.transform_point(Point3::new(1.0, 0.0, 0.0));
        assert_relative_eq!(moved, Point3::new(0.0, 7.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_about_pivot() {
        let origin = Vec3::new(1.0, 0.0, 0.0);
        let point = Vec3::new(2.0, 0.0, 0.0);

        let rotated = rotate_about(point, origin, Axis::Y, std::f32::consts::FRAC_PI_2);
        assert_relative_eq!(rotated, Vec3::new(1.0, 0.0, -1.0), epsilon = EPSILON);

        // The pivot itself never moves
        let pivot = rotate_about(origin, origin, Axis::X, 1.234);
        assert_relative_eq!(pivot, origin, epsilon = EPSILON);
    }

    #[test]
    fn test_rotate_about_preserves_distance() {
        let origin = Vec3::zeros();
        let point = Vec3::new(0.0, 80.0, 60.0);
        for axis in [Axis::X, Axis::Y, Axis::Z] {
            let rotated = rotate_about(point, origin, axis, 0.37);
            assert_relative_eq!(rotated.norm(), point.norm(), epsilon = 1e-3);
        }
    }

    #[test]
    fn test_look_at_maps_target_onto_negative_z() {
        let eye = Vec3::new(0.0, 80.0, 60.0);
        let view = Mat4::look_at(eye, Vec3::zeros(), Vec3::y());

        let target_in_view = view.transform_point(&Point3::origin());
        assert_relative_eq!(target_in_view.x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(target_in_view.y, 0.0, epsilon = 1e-4);
        assert_relative_eq!(target_in_view.z, -100.0, epsilon = 1e-3);
    }

    #[test]
    fn test_degree_conversion() {
        assert_relative_eq!(utils::deg_to_rad(180.0), constants::PI, epsilon = EPSILON);
        assert_relative_eq!(utils::rad_to_deg(constants::PI), 180.0, epsilon = 1e-3);
    }
}
