//! Scene setup from configuration
//!
//! Turns a [`SceneConfig`] into registered lights and drawables. Mesh names
//! are resolved by the backend; each object gets a Phong material bound to
//! its light's shadow map for the camera pass and a depth-only material
//! writing into that shadow map for the shadow pass.

use crate::config::Config;
use crate::core::SceneConfig;
use crate::render::{
    BackendMesh, Drawable, DrawableId, LightId, LightMarker, MaterialDesc, MaterialKind, RenderBackend,
    RenderError, RenderResult, Renderer, ShadowLight,
};

/// Mesh name used for light markers
pub const LIGHT_MARKER_MESH: &str = "light_cube";

/// Uniform scale of light markers
pub const LIGHT_MARKER_SCALE: f32 = 2.0;

/// Handles of everything a scene registered, in configuration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SceneHandles {
    /// One per configured light
    pub lights: Vec<LightId>,
    /// One per configured object
    pub drawables: Vec<DrawableId>,
}

/// Create a renderer for `scene` and populate it
pub fn build_renderer<B: RenderBackend>(backend: B, scene: &SceneConfig) -> RenderResult<(Renderer<B>, SceneHandles)> {
    let mut renderer = Renderer::new(backend, scene.renderer.clone());
    let handles = load_scene(&mut renderer, scene)?;
    Ok((renderer, handles))
}

/// Register a scene's lights and objects with an existing renderer
///
/// Light indices in the configuration are relative to the lights this call
/// registers, so the renderer is expected to start without lights.
pub fn load_scene<B: RenderBackend>(renderer: &mut Renderer<B>, scene: &SceneConfig) -> RenderResult<SceneHandles> {
    scene.validate().map_err(|e| RenderError::InvalidScene(e.to_string()))?;
    if renderer.light_count() != 0 {
        return Err(RenderError::InvalidScene(format!(
            "renderer already has {} lights registered",
            renderer.light_count()
        )));
    }

    let mut handles = SceneHandles::default();
    let default_resolution = renderer.config().shadow_map_resolution;

    for (index, config) in scene.lights.iter().enumerate() {
        let id = renderer.add_light(ShadowLight::from_config(config, default_resolution))?;

        if config.show_marker {
            let backend = renderer.backend_mut();
            let mesh = backend.register_mesh(LIGHT_MARKER_MESH)?;
            let material = backend.create_material(&MaterialDesc {
                kind: MaterialKind::Emissive { color: config.color },
                light_index: index,
            })?;
            renderer.attach_light_marker(id, LightMarker::new(BackendMesh::new(mesh, material), LIGHT_MARKER_SCALE))?;
        }

        handles.lights.push(id);
    }

    for object in &scene.objects {
        let light_id = handles.lights[object.light_index];
        let (shadow_map, radiance) = {
            let light = renderer.light(light_id).ok_or(RenderError::UnknownLight(light_id.0))?;
            let target = light.shadow_target().ok_or_else(|| {
                RenderError::ResourceCreationFailed(format!("light {} has no shadow target", light_id.0))
            })?;
            (target, light.radiance())
        };

        let backend = renderer.backend_mut();
        let mesh = backend.register_mesh(&object.mesh)?;
        let mut drawable = Drawable::new(object.name.clone(), object.transform.clone(), object.light_index)
            .with_instance_count(object.instance_count);

        if object.visible {
            let material = backend.create_material(&MaterialDesc {
                kind: MaterialKind::Phong {
                    light_radiance: radiance,
                    shadow_map,
                },
                light_index: object.light_index,
            })?;
            drawable = drawable.with_lit(BackendMesh::new(mesh, material));
        }

        if object.casts_shadow {
            let material = backend.create_material(&MaterialDesc {
                kind: MaterialKind::Shadow { target: shadow_map },
                light_index: object.light_index,
            })?;
            drawable = drawable.with_shadow(BackendMesh::new(mesh, material));
        }

        handles.drawables.push(renderer.add_drawable(drawable)?);
    }

    log::info!(
        "Scene loaded: {} lights, {} objects",
        handles.lights.len(),
        handles.drawables.len()
    );
    Ok(handles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LightConfig, ObjectConfig};
    use crate::foundation::math::{Transform, Vec3};
    use crate::render::backends::RecordingBackend;

    #[test]
    fn test_default_scene_registration() {
        let scene = SceneConfig::default();
        let (renderer, handles) = build_renderer(RecordingBackend::new(), &scene).unwrap();

        assert_eq!(handles.lights.len(), 3);
        assert_eq!(handles.drawables.len(), 3);
        assert_eq!(renderer.backend().live_target_count(), 3);
        for id in &handles.lights {
            assert!(renderer.light_marker(*id).is_some());
            let target = renderer.light(*id).unwrap().shadow_target().unwrap();
            assert_eq!(renderer.backend().target_resolution(target), Some(2048));
        }

        let floor = renderer.drawable(handles.drawables[2]).unwrap();
        assert_eq!(floor.name, "floor");
        assert_eq!(floor.light_index, 2);
        assert!(floor.is_camera_visible() && floor.casts_shadow());
    }

    #[test]
    fn test_materials_bind_the_assigned_light() {
        let mut scene = SceneConfig::default();
        scene.lights[1].shadow_map_resolution = Some(512);
        scene.lights.iter_mut().for_each(|light| light.show_marker = false);

        let (mut renderer, handles) = build_renderer(RecordingBackend::new(), &scene).unwrap();
        let target = renderer.light(handles.lights[1]).unwrap().shadow_target().unwrap();
        assert_eq!(renderer.backend().target_resolution(target), Some(512));

        // Render one frame and check the light 1 object's materials
        let camera = crate::render::Camera::default();
        renderer
            .render_frame(&camera, crate::foundation::time::FrameTiming::new(16.0, 0.016))
            .unwrap();

        let backend = renderer.backend();
        let kinds: Vec<_> = backend
            .draws()
            .filter_map(|draw| backend.material(draw.material))
            .filter(|desc| desc.light_index == 1)
            .map(|desc| desc.kind)
            .collect();
        assert!(kinds.contains(&MaterialKind::Shadow { target }));
        assert!(kinds
            .iter()
            .any(|kind| matches!(kind, MaterialKind::Phong { shadow_map, .. } if *shadow_map == target)));
    }

    #[test]
    fn test_visibility_flags_control_renderables() {
        let mut hidden = ObjectConfig::new("occluder", "cube", Transform::identity(), 0);
        hidden.visible = false;
        let mut unshadowed = ObjectConfig::new("glass", "sphere", Transform::identity(), 0);
        unshadowed.casts_shadow = false;

        let scene = SceneConfig {
            lights: vec![LightConfig::new(Vec3::new(0.0, 80.0, 60.0), 16.0)],
            objects: vec![hidden, unshadowed],
            ..SceneConfig::default()
        };
        let (renderer, handles) = build_renderer(RecordingBackend::new(), &scene).unwrap();

        let occluder = renderer.drawable(handles.drawables[0]).unwrap();
        assert!(!occluder.is_camera_visible() && occluder.casts_shadow());
        let glass = renderer.drawable(handles.drawables[1]).unwrap();
        assert!(glass.is_camera_visible() && !glass.casts_shadow());
    }

    #[test]
    fn test_renderer_default_resolution_applies() {
        let mut scene = SceneConfig::default();
        scene.renderer = scene.renderer.with_shadow_map_resolution(1024);
        scene.lights[2].shadow_map_resolution = Some(256);

        let (renderer, handles) = build_renderer(RecordingBackend::new(), &scene).unwrap();
        let resolutions: Vec<_> = handles
            .lights
            .iter()
            .map(|id| renderer.light(*id).unwrap().resolution())
            .collect();
        assert_eq!(resolutions, vec![1024, 1024, 256]);
    }

    #[test]
    fn test_invalid_scene_is_rejected() {
        let mut scene = SceneConfig::default();
        scene.objects[0].light_index = 7;
        let result = build_renderer(RecordingBackend::new(), &scene);
        assert!(matches!(result, Err(RenderError::InvalidScene(_))));
    }

    #[test]
    fn test_loading_twice_is_rejected() {
        let scene = SceneConfig::default();
        let (mut renderer, _) = build_renderer(RecordingBackend::new(), &scene).unwrap();
        assert!(matches!(load_scene(&mut renderer, &scene), Err(RenderError::InvalidScene(_))));
    }
}
