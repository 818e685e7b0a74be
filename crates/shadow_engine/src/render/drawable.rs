//! Drawables: meshes bound to materials and to one light's passes

use std::fmt;

use crate::foundation::math::{Mat4, Transform, Vec3};
use crate::render::api::{BackendResult, DrawTransforms, DrawUniforms, MaterialHandle, MeshHandle, RenderBackend};
use crate::render::primitives::Camera;

/// Something that can draw itself against a camera
///
/// Implementations own their shader/material/geometry. The renderer hands
/// over the per-draw uniform block; uploading it and issuing the draw is the
/// implementation's job.
pub trait MeshRenderable {
    /// Draw into whatever target is currently bound
    fn draw(
        &mut self,
        backend: &mut dyn RenderBackend,
        camera: &Camera,
        model: &Mat4,
        uniforms: &DrawUniforms,
    ) -> BackendResult<()>;
}

/// A mesh and material pair living in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackendMesh {
    /// Geometry
    pub mesh: MeshHandle,
    /// Shader program and parameters
    pub material: MaterialHandle,
}

impl BackendMesh {
    /// Pair a mesh with a material
    pub fn new(mesh: MeshHandle, material: MaterialHandle) -> Self {
        Self { mesh, material }
    }
}

impl MeshRenderable for BackendMesh {
    fn draw(
        &mut self,
        backend: &mut dyn RenderBackend,
        camera: &Camera,
        model: &Mat4,
        uniforms: &DrawUniforms,
    ) -> BackendResult<()> {
        backend.upload_draw_uniforms(self.material, uniforms)?;
        backend.draw_mesh(
            self.mesh,
            self.material,
            &DrawTransforms {
                model: *model,
                view: camera.view_matrix(),
                projection: camera.projection_matrix(),
            },
        )
    }
}

/// Index of a drawable inside its renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(pub usize);

/// Index of a light inside its renderer; also its pass index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(pub usize);

/// A scene object
///
/// One object owns one [`Transform`] shared by its camera-pass renderable
/// (`lit`) and its shadow-pass renderable (`shadow`), so animation moves the
/// object and its shadow together. `light_index` names the single light whose
/// passes draw it.
pub struct Drawable {
    /// Display name, used in logs
    pub name: String,
    /// Placement, mutated by the animation pass
    pub transform: Transform,
    /// Light pass this object belongs to
    pub light_index: usize,
    /// Instance count; above the renderer's threshold the object spins
    pub instance_count: u32,
    lit: Option<Box<dyn MeshRenderable>>,
    shadow: Option<Box<dyn MeshRenderable>>,
}

impl Drawable {
    /// Create an object with no renderables yet
    pub fn new(name: impl Into<String>, transform: Transform, light_index: usize) -> Self {
        Self {
            name: name.into(),
            transform,
            light_index,
            instance_count: 1,
            lit: None,
            shadow: None,
        }
    }

    /// Builder pattern: renderable used in the camera pass
    pub fn with_lit(mut self, renderable: impl MeshRenderable + 'static) -> Self {
        self.lit = Some(Box::new(renderable));
        self
    }

    /// Builder pattern: renderable used in the shadow pass
    pub fn with_shadow(mut self, renderable: impl MeshRenderable + 'static) -> Self {
        self.shadow = Some(Box::new(renderable));
        self
    }

    /// Builder pattern: set the instance count
    pub fn with_instance_count(mut self, count: u32) -> Self {
        self.instance_count = count;
        self
    }

    /// Drawn in the camera pass
    pub fn is_camera_visible(&self) -> bool {
        self.lit.is_some()
    }

    /// Drawn in the shadow pass
    pub fn casts_shadow(&self) -> bool {
        self.shadow.is_some()
    }

    pub(crate) fn lit_mut(&mut self) -> Option<&mut (dyn MeshRenderable + 'static)> {
        self.lit.as_deref_mut()
    }

    pub(crate) fn shadow_mut(&mut self) -> Option<&mut (dyn MeshRenderable + 'static)> {
        self.shadow.as_deref_mut()
    }
}

impl fmt::Debug for Drawable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Drawable")
            .field("name", &self.name)
            .field("transform", &self.transform)
            .field("light_index", &self.light_index)
            .field("instance_count", &self.instance_count)
            .field("lit", &self.lit.is_some())
            .field("shadow", &self.shadow.is_some())
            .finish()
    }
}

/// Visual marker that follows a light around
pub struct LightMarker {
    /// Marker placement; translation tracks the light
    pub transform: Transform,
    renderable: Box<dyn MeshRenderable>,
}

impl LightMarker {
    /// Wrap a renderable drawn at `scale` around the light position
    pub fn new(renderable: impl MeshRenderable + 'static, scale: f32) -> Self {
        Self {
            transform: Transform::identity().with_uniform_scale(scale),
            renderable: Box::new(renderable),
        }
    }

    /// Move the marker onto the light
    pub fn follow(&mut self, position: Vec3) {
        self.transform.translate = position;
    }

    pub(crate) fn renderable_mut(&mut self) -> &mut (dyn MeshRenderable + 'static) {
        self.renderable.as_mut()
    }
}

impl fmt::Debug for LightMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LightMarker").field("transform", &self.transform).finish()
    }
}
