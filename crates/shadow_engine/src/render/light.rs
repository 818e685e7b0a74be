//! Shadow-casting directional lights
//!
//! A [`ShadowLight`] holds only physical and shadow state: where it is, what
//! it aims at, how it moves and which depth target its shadow map lives in.
//! Visual markers are attached separately by the renderer.

use rand::Rng;

use crate::core::{LightConfig, ProjectionConfig};
use crate::foundation::math::{rotate_about, utils, Axis, Mat4, Mat4Ext, Transform, Vec3};
use crate::render::api::RenderTargetHandle;

/// Light-space projection, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightProjection {
    /// Symmetric orthographic box
    Orthographic {
        /// Half width/height of the box
        half_extent: f32,
        /// Near plane
        near: f32,
        /// Far plane
        far: f32,
    },
    /// Square perspective frustum
    Perspective {
        /// Vertical field of view in radians
        fov: f32,
        /// Near plane
        near: f32,
        /// Far plane
        far: f32,
    },
}

impl LightProjection {
    /// Projection matrix for this configuration
    pub fn matrix(&self) -> Mat4 {
        match *self {
            Self::Orthographic { half_extent, near, far } => {
                Mat4::orthographic(-half_extent, half_extent, -half_extent, half_extent, near, far)
            }
            // Shadow maps are square
            Self::Perspective { fov, near, far } => Mat4::perspective(fov, 1.0, near, far),
        }
    }
}

impl From<ProjectionConfig> for LightProjection {
    fn from(config: ProjectionConfig) -> Self {
        match config {
            ProjectionConfig::Orthographic { half_extent, near, far } => Self::Orthographic { half_extent, near, far },
            ProjectionConfig::Perspective { fov_deg, near, far } => Self::Perspective {
                fov: utils::deg_to_rad(fov_deg),
                near,
                far,
            },
        }
    }
}

/// A directional light that renders its own shadow map
#[derive(Debug, Clone)]
pub struct ShadowLight {
    position: Vec3,
    focal_point: Vec3,
    up: Vec3,
    intensity: f32,
    color: Vec3,
    casts_shadows: bool,
    speed: f32,
    floor_y: f32,
    resolution: u32,
    projection: LightProjection,
    shadow_target: Option<RenderTargetHandle>,
}

impl ShadowLight {
    /// Create a light from its configuration
    ///
    /// `default_resolution` applies when the configuration doesn't override
    /// the shadow map size. The depth target is allocated later, when the
    /// light is registered with a renderer.
    pub fn from_config(config: &LightConfig, default_resolution: u32) -> Self {
        Self {
            position: config.position,
            focal_point: config.focal_point,
            up: config.up,
            intensity: config.intensity,
            color: config.color,
            casts_shadows: config.casts_shadows,
            speed: config.speed,
            floor_y: config.floor_y,
            resolution: config.shadow_map_resolution.unwrap_or(default_resolution),
            projection: config.projection.into(),
            shadow_target: None,
        }
    }

    /// White shadow-casting light aimed at the origin with default projection
    pub fn new(position: Vec3, speed: f32) -> Self {
        Self::from_config(&LightConfig::new(position, speed), 2048)
    }

    /// Builder pattern: lowest permitted height
    pub fn with_floor(mut self, floor_y: f32) -> Self {
        self.floor_y = floor_y;
        self
    }

    /// Builder pattern: toggle the shadow sub-pass
    pub fn with_shadows(mut self, casts_shadows: bool) -> Self {
        self.casts_shadows = casts_shadows;
        self
    }

    /// Builder pattern: replace the light-space projection
    pub fn with_projection(mut self, projection: LightProjection) -> Self {
        self.projection = projection;
        self
    }

    /// Builder pattern: set the shadow map size
    pub fn with_resolution(mut self, resolution: u32) -> Self {
        self.resolution = resolution;
        self
    }

    /// Move the light along its wobbling orbit
    ///
    /// Each call draws a jitter factor `min(u + 0.5, 1)` with `u` uniform in
    /// [0, 1), scales the signed base speed by it, then rotates the position
    /// about the focal point: Y by the magnitude, Z and X by the signed value.
    /// A position that ends below the floor is clamped onto it and the base
    /// speed changes sign. Returns `true` when that bounce happened.
    pub fn advance<R: Rng>(&mut self, delta_time: f32, rng: &mut R) -> bool {
        let jitter = (rng.gen::<f32>() + 0.5).min(1.0);
        let speed = jitter * self.speed;
        let signed_step = utils::deg_to_rad(speed) * delta_time;
        let unsigned_step = utils::deg_to_rad(speed.abs()) * delta_time;

        let mut position = rotate_about(self.position, self.focal_point, Axis::Y, unsigned_step);
        position = rotate_about(position, self.focal_point, Axis::Z, signed_step);
        position = rotate_about(position, self.focal_point, Axis::X, signed_step);

        let bounced = position.y < self.floor_y;
        if bounced {
            position.y = self.floor_y;
            self.speed = -self.speed;
            log::trace!("Light bounced off floor y={}, speed now {}", self.floor_y, self.speed);
        }

        self.position = position;
        bounced
    }

    /// View matrix looking from the light toward its focal point
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at(self.position, self.focal_point, self.up)
    }

    /// Light-space model-view-projection for an object's transform
    ///
    /// Pure function of the light's current state and `transform`.
    pub fn light_space_matrix(&self, transform: &Transform) -> Mat4 {
        self.projection.matrix() * self.view_matrix() * transform.to_matrix()
    }

    /// Current world position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Point the light aims at and orbits
    pub fn focal_point(&self) -> Vec3 {
        self.focal_point
    }

    /// Signed base angular speed in degrees per second
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Lowest permitted height
    pub fn floor_y(&self) -> f32 {
        self.floor_y
    }

    /// Radiant intensity
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Linear RGB colour
    pub fn color(&self) -> Vec3 {
        self.color
    }

    /// Colour scaled by intensity
    pub fn radiance(&self) -> Vec3 {
        self.color * self.intensity
    }

    /// Whether the shadow sub-pass runs
    pub fn casts_shadows(&self) -> bool {
        self.casts_shadows
    }

    /// Shadow map edge length
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Light-space projection
    pub fn projection(&self) -> LightProjection {
        self.projection
    }

    /// Depth target, once the light is registered
    pub fn shadow_target(&self) -> Option<RenderTargetHandle> {
        self.shadow_target
    }

    pub(crate) fn set_shadow_target(&mut self, target: Option<RenderTargetHandle>) {
        self.shadow_target = target;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Point3, Vec4};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_zero_delta_leaves_position_unchanged() {
        let mut light = ShadowLight::new(Vec3::new(0.0, 80.0, 60.0), 16.0);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!light.advance(0.0, &mut rng));
        assert_relative_eq!(light.position(), Vec3::new(0.0, 80.0, 60.0), epsilon = 1e-4);
    }

    #[test]
    fn test_advance_keeps_orbit_radius() {
        let mut light = ShadowLight::new(Vec3::new(70.0, 100.0, 0.0), 9.0).with_floor(-1000.0);
        let radius = light.position().norm();
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..500 {
            light.advance(1.0 / 60.0, &mut rng);
        }
        assert_relative_eq!(light.position().norm(), radius, epsilon = 1e-2);
    }

    #[test]
    fn test_floor_is_never_crossed() {
        let mut light = ShadowLight::new(Vec3::new(0.0, 80.0, 60.0), 90.0);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..5000 {
            light.advance(0.1, &mut rng);
            assert!(light.position().y >= light.floor_y());
        }
    }

    #[test]
    fn test_bounce_flips_speed_exactly_once() {
        let mut light = ShadowLight::new(Vec3::new(0.0, 80.0, 60.0), 90.0);
        let mut rng = StdRng::seed_from_u64(4);
        let mut bounces = 0;
        for _ in 0..5000 {
            let before = light.speed();
            let bounced = light.advance(0.1, &mut rng);
            if bounced {
                bounces += 1;
                assert_eq!(light.speed(), -before);
                assert_eq!(light.position().y, light.floor_y());
            } else {
                assert_eq!(light.speed(), before);
            }
        }
        assert!(bounces > 0, "a fast light must reach its floor");
    }

    #[test]
    fn test_light_space_matrix_centers_focal_point() {
        let light = ShadowLight::new(Vec3::new(0.0, 80.0, 60.0), 16.0);
        let clip = light.light_space_matrix(&Transform::identity()) * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert_relative_eq!(clip.x / clip.w, 0.0, epsilon = 1e-5);
        assert_relative_eq!(clip.y / clip.w, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_light_space_matrix_includes_model() {
        let light = ShadowLight::new(Vec3::new(0.0, 80.0, 60.0), 16.0);
        let transform = Transform::from_translation(Vec3::new(0.0, 0.0, 20.0)).with_uniform_scale(20.0);

        let direct = light.light_space_matrix(&transform).transform_point(&Point3::origin());
        let via_world = light
            .light_space_matrix(&Transform::identity())
            .transform_point(&Point3::new(0.0, 0.0, 20.0));
        assert_relative_eq!(direct, via_world, epsilon = 1e-5);
    }

    #[test]
    fn test_perspective_projection_from_config() {
        let projection: LightProjection = ProjectionConfig::Perspective { fov_deg: 90.0, near: 1.0, far: 100.0 }.into();
        let LightProjection::Perspective { fov, .. } = projection else {
            panic!("expected perspective projection");
        };
        assert_relative_eq!(fov, std::f32::consts::FRAC_PI_2);
    }
}
