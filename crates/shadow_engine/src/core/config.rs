//! # Renderer and Scene Configuration
//!
//! Serializable configuration for the multi-light renderer and for scene
//! setup. Scene files describe lights and objects in registration order; that
//! order is the pass order at render time.
//!
//! ```toml
//! [[lights]]
//! position = [0.0, 80.0, 60.0]
//! speed = 16.0
//!
//! [[objects]]
//! name = "floor"
//! mesh = "floor"
//! light_index = 0
//! transform = { translate = [0.0, 0.0, 0.0], rotate = [0.0, 0.0, 0.0], scale = [6.0, 6.0, 6.0] }
//! ```

use serde::{Deserialize, Serialize};

use crate::config::{Config, ConfigError};
use crate::foundation::math::{Transform, Vec3};

/// Largest shadow map edge accepted by configuration validation
pub const MAX_SHADOW_MAP_RESOLUTION: u32 = 16384;

/// Check that a shadow map size is a supported power of two
pub fn validate_shadow_resolution(resolution: u32) -> Result<(), ConfigError> {
    if resolution == 0 || !resolution.is_power_of_two() || resolution > MAX_SHADOW_MAP_RESOLUTION {
        return Err(ConfigError::Invalid(format!(
            "shadow map resolution {resolution} must be a power of two in 1..={MAX_SHADOW_MAP_RESOLUTION}"
        )));
    }
    Ok(())
}

/// Automatic rotation applied to "hero" objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Objects with an instance count strictly above this spin
    pub instance_threshold: u32,
    /// Spin rate about the vertical axis, degrees per second
    pub rotation_deg_per_sec: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            instance_threshold: 10,
            rotation_deg_per_sec: 5.0,
        }
    }
}

/// Renderer-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Clear colour of the camera framebuffer [R, G, B, A]
    pub clear_color: [f32; 4],
    /// Clear colour of every shadow target; white reads as "unoccluded"
    pub shadow_clear_color: [f32; 4],
    /// Default square shadow map size for lights that don't override it
    pub shadow_map_resolution: u32,
    /// Hero-object animation rule
    pub animation: AnimationConfig,
    /// Seed for the light wobble RNG; `None` seeds from entropy
    pub rng_seed: Option<u64>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            shadow_clear_color: [1.0, 1.0, 1.0, 1.0],
            shadow_map_resolution: 2048,
            animation: AnimationConfig::default(),
            rng_seed: None,
        }
    }
}

impl RendererConfig {
    /// Builder pattern: fix the light wobble seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    /// Builder pattern: set the default shadow map size
    pub fn with_shadow_map_resolution(mut self, resolution: u32) -> Self {
        self.shadow_map_resolution = resolution;
        self
    }
}

impl Config for RendererConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        validate_shadow_resolution(self.shadow_map_resolution)?;
        if !self.animation.rotation_deg_per_sec.is_finite() {
            return Err(ConfigError::Invalid("animation rotation rate must be finite".into()));
        }
        Ok(())
    }
}

/// Light projection, fixed when the light is created
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProjectionConfig {
    /// Symmetric orthographic box around the light's view axis
    Orthographic {
        /// Half width/height of the box
        half_extent: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
    /// Square perspective frustum
    Perspective {
        /// Vertical field of view in degrees
        fov_deg: f32,
        /// Near plane distance
        near: f32,
        /// Far plane distance
        far: f32,
    },
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self::Orthographic {
            half_extent: 150.0,
            near: 0.01,
            far: 500.0,
        }
    }
}

fn default_focal_point() -> Vec3 {
    Vec3::zeros()
}

fn default_up() -> Vec3 {
    Vec3::new(0.0, 1.0, 0.0)
}

fn default_intensity() -> f32 {
    2000.0
}

fn default_color() -> Vec3 {
    Vec3::new(1.0, 1.0, 1.0)
}

fn default_floor_y() -> f32 {
    60.0
}

fn default_true() -> bool {
    true
}

/// One shadow-casting light
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    /// Initial world position
    pub position: Vec3,
    /// Point the light orbits and aims at
    #[serde(default = "default_focal_point")]
    pub focal_point: Vec3,
    /// Up vector of the light's view
    #[serde(default = "default_up")]
    pub up: Vec3,
    /// Radiant intensity
    #[serde(default = "default_intensity")]
    pub intensity: f32,
    /// Linear RGB colour
    #[serde(default = "default_color")]
    pub color: Vec3,
    /// Whether a shadow sub-pass runs for this light
    #[serde(default = "default_true")]
    pub casts_shadows: bool,
    /// Signed orbit speed, degrees per second
    pub speed: f32,
    /// Lowest permitted height of the light
    #[serde(default = "default_floor_y")]
    pub floor_y: f32,
    /// Per-light shadow map size; falls back to the renderer default
    #[serde(default)]
    pub shadow_map_resolution: Option<u32>,
    /// Light-space projection
    #[serde(default)]
    pub projection: ProjectionConfig,
    /// Draw a small emissive marker at the light's position
    #[serde(default = "default_true")]
    pub show_marker: bool,
}

impl LightConfig {
    /// A white, shadow-casting light aimed at the origin
    pub fn new(position: Vec3, speed: f32) -> Self {
        Self {
            position,
            focal_point: default_focal_point(),
            up: default_up(),
            intensity: default_intensity(),
            color: default_color(),
            casts_shadows: true,
            speed,
            floor_y: default_floor_y(),
            shadow_map_resolution: None,
            projection: ProjectionConfig::default(),
            show_marker: true,
        }
    }
}

fn default_instance_count() -> u32 {
    1
}

/// One mesh placed in the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    /// Display name, used in logs
    pub name: String,
    /// Mesh asset name resolved by the backend
    pub mesh: String,
    /// Initial transform
    #[serde(default)]
    pub transform: Transform,
    /// Index of the single light whose passes draw this object
    #[serde(default)]
    pub light_index: usize,
    /// Instance count; above the animation threshold the object spins
    #[serde(default = "default_instance_count")]
    pub instance_count: u32,
    /// Drawn in the camera (lit) pass
    #[serde(default = "default_true")]
    pub visible: bool,
    /// Drawn in the shadow pass
    #[serde(default = "default_true")]
    pub casts_shadow: bool,
}

impl ObjectConfig {
    /// Visible, shadow-casting object bound to `light_index`
    pub fn new(name: impl Into<String>, mesh: impl Into<String>, transform: Transform, light_index: usize) -> Self {
        Self {
            name: name.into(),
            mesh: mesh.into(),
            transform,
            light_index,
            instance_count: default_instance_count(),
            visible: true,
            casts_shadow: true,
        }
    }

    /// Builder pattern: set the instance count
    pub fn with_instance_count(mut self, count: u32) -> Self {
        self.instance_count = count;
        self
    }
}

/// Initial camera placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Camera position
    pub position: Vec3,
    /// Look-at point
    pub target: Vec3,
    /// Vertical field of view in degrees
    pub fov_deg: f32,
    /// Width / height
    pub aspect: f32,
    /// Near plane
    pub near: f32,
    /// Far plane
    pub far: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(30.0, 30.0, 30.0),
            target: Vec3::zeros(),
            fov_deg: 75.0,
            aspect: 16.0 / 9.0,
            near: 1e-2,
            far: 1000.0,
        }
    }
}

/// Complete scene description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Renderer settings
    #[serde(default)]
    pub renderer: RendererConfig,
    /// Camera placement
    #[serde(default)]
    pub camera: CameraConfig,
    /// Lights in pass order
    #[serde(default)]
    pub lights: Vec<LightConfig>,
    /// Objects in draw order
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
}

impl Default for SceneConfig {
    /// Three orbiting lights over two characters and a floor
    fn default() -> Self {
        let character = |z: f32, scale: f32| Transform::from_translation(Vec3::new(0.0, 0.0, z)).with_uniform_scale(scale);

        Self {
            renderer: RendererConfig::default(),
            camera: CameraConfig::default(),
            lights: vec![
                LightConfig::new(Vec3::new(0.0, 80.0, 60.0), 16.0),
                LightConfig::new(Vec3::new(70.0, 100.0, 0.0), 9.0),
                LightConfig::new(Vec3::new(-80.0, 70.0, 0.0), 7.0),
            ],
            objects: vec![
                ObjectConfig::new("mary_front", "mary", character(20.0, 20.0), 0),
                ObjectConfig::new("mary_back", "mary", character(-20.0, 15.0), 1),
                ObjectConfig::new("floor", "floor", Transform::identity().with_uniform_scale(6.0), 2),
            ],
        }
    }
}

impl Config for SceneConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.renderer.validate()?;

        if self.lights.is_empty() {
            return Err(ConfigError::Invalid("scene has no light source".into()));
        }

        for (index, light) in self.lights.iter().enumerate() {
            if let Some(resolution) = light.shadow_map_resolution {
                validate_shadow_resolution(resolution)?;
            }
            if light.up.norm_squared() == 0.0 {
                return Err(ConfigError::Invalid(format!("light {index} has a zero up vector")));
            }
            if (light.position - light.focal_point).norm_squared() == 0.0 {
                return Err(ConfigError::Invalid(format!("light {index} sits on its own focal point")));
            }
        }

        for object in &self.objects {
            if object.light_index >= self.lights.len() {
                return Err(ConfigError::Invalid(format!(
                    "object '{}' is bound to light {} but the scene has {} lights",
                    object.name,
                    object.light_index,
                    self.lights.len()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_scene_is_valid() {
        let scene = SceneConfig::default();
        scene.validate().unwrap();
        assert_eq!(scene.lights.len(), 3);
        assert_eq!(scene.renderer.shadow_map_resolution, 2048);
        assert_eq!(scene.renderer.animation.instance_threshold, 10);
    }

    #[test]
    fn test_shadow_resolution_validation() {
        assert!(validate_shadow_resolution(2048).is_ok());
        assert!(validate_shadow_resolution(256).is_ok());
        assert!(validate_shadow_resolution(0).is_err());
        assert!(validate_shadow_resolution(1000).is_err());
        assert!(validate_shadow_resolution(32768).is_err());
    }

    #[test]
    fn test_scene_without_lights_is_rejected() {
        let scene = SceneConfig {
            lights: Vec::new(),
            objects: Vec::new(),
            ..SceneConfig::default()
        };
        assert!(matches!(scene.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_out_of_range_light_index_is_rejected() {
        let mut scene = SceneConfig::default();
        scene.objects[0].light_index = 3;
        let err = scene.validate().unwrap_err();
        assert!(err.to_string().contains("light 3"));
    }

    #[test]
    fn test_parse_toml_scene_with_defaults() {
        let text = r#"
            [renderer]
            shadow_map_resolution = 1024
            rng_seed = 7

            [[lights]]
            position = [0.0, 80.0, 60.0]
            speed = 16.0

            [[lights]]
            position = [70.0, 100.0, 0.0]
            speed = -9.0
            casts_shadows = false
            projection = { kind = "perspective", fov_deg = 60.0, near = 1.0, far = 300.0 }

            [[objects]]
            name = "floor"
            mesh = "floor"
            light_index = 1
            instance_count = 12
            transform = { translate = [0.0, 0.0, 0.0], rotate = [0.0, 0.0, 0.0], scale = [6.0, 6.0, 6.0] }
        "#;

        let scene = SceneConfig::from_str_for_path(text, Path::new("scene.toml")).unwrap();
        assert_eq!(scene.renderer.shadow_map_resolution, 1024);
        assert_eq!(scene.renderer.rng_seed, Some(7));
        assert_eq!(scene.lights[0].floor_y, 60.0);
        assert_eq!(scene.lights[0].up, Vec3::new(0.0, 1.0, 0.0));
        assert!(scene.lights[0].casts_shadows);
        assert!(!scene.lights[1].casts_shadows);
        assert!(matches!(scene.lights[1].projection, ProjectionConfig::Perspective { .. }));
        assert_eq!(scene.objects[0].instance_count, 12);
        assert_eq!(scene.objects[0].transform.scale, Vec3::new(6.0, 6.0, 6.0));
        assert!(scene.objects[0].visible && scene.objects[0].casts_shadow);
    }

    #[test]
    fn test_parse_rejects_bad_resolution() {
        let text = r#"
            [[lights]]
            position = [0.0, 80.0, 60.0]
            speed = 16.0
            shadow_map_resolution = 1000
        "#;
        assert!(SceneConfig::from_str_for_path(text, Path::new("scene.toml")).is_err());
    }
}
