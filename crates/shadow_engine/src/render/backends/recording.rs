//! Headless backend that records every command it receives
//!
//! Used by the demo to run scenes without a GPU and by tests to assert on the
//! exact command stream the render loop produced. Bound target and blend
//! state are tracked like a real API would, and each draw is stamped with
//! the state active when it was issued.

use std::collections::HashMap;

use crate::foundation::math::Mat4;
use crate::render::api::{
    BackendResult, BlendState, ClearFlags, DepthFunc, DrawTransforms, DrawUniforms, MaterialDesc,
    MaterialHandle, MeshHandle, RenderBackend, RenderTarget, RenderTargetHandle,
};
use crate::render::RenderError;

/// A draw call together with the state it ran under
#[derive(Debug, Clone, PartialEq)]
pub struct DrawRecord {
    /// Mesh drawn
    pub mesh: MeshHandle,
    /// Material used
    pub material: MaterialHandle,
    /// Target bound at draw time
    pub target: RenderTarget,
    /// Blend state at draw time
    pub blend: BlendState,
    /// Uniforms last uploaded to the material, if any
    pub uniforms: Option<DrawUniforms>,
    /// Model matrix passed with the draw
    pub model: Mat4,
}

/// One recorded backend call
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// `create_depth_target`
    CreateDepthTarget {
        /// New handle
        target: RenderTargetHandle,
        /// Edge length in texels
        resolution: u32,
    },
    /// `destroy_render_target`
    DestroyRenderTarget(RenderTargetHandle),
    /// `bind_render_target`
    BindRenderTarget(RenderTarget),
    /// `clear`, with the target and colour in effect
    Clear {
        /// Target cleared
        target: RenderTarget,
        /// Buffers cleared
        flags: ClearFlags,
        /// Clear colour in effect
        color: [f32; 4],
    },
    /// `set_depth_test`
    SetDepthTest(DepthFunc),
    /// `set_blend_state`
    SetBlendState(BlendState),
    /// `upload_draw_uniforms`
    UploadDrawUniforms {
        /// Destination material
        material: MaterialHandle,
        /// Uploaded block
        uniforms: DrawUniforms,
    },
    /// `draw_mesh`
    Draw(DrawRecord),
}

/// Command-recording backend
#[derive(Debug)]
pub struct RecordingBackend {
    commands: Vec<BackendCommand>,
    targets: HashMap<RenderTargetHandle, u32>,
    meshes: HashMap<String, MeshHandle>,
    materials: Vec<MaterialDesc>,
    material_uniforms: HashMap<MaterialHandle, DrawUniforms>,
    bound_target: RenderTarget,
    blend_state: BlendState,
    depth_func: DepthFunc,
    clear_color: [f32; 4],
    next_target_id: u64,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingBackend {
    /// Create an empty backend with the screen bound and blending off
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
            targets: HashMap::new(),
            meshes: HashMap::new(),
            materials: Vec::new(),
            material_uniforms: HashMap::new(),
            bound_target: RenderTarget::Screen,
            blend_state: BlendState::Disabled,
            depth_func: DepthFunc::Disabled,
            clear_color: [0.0, 0.0, 0.0, 0.0],
            next_target_id: 1,
        }
    }

    /// All commands recorded so far
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Drain the command log, keeping resource state
    pub fn take_commands(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Draw calls in issue order
    pub fn draws(&self) -> impl Iterator<Item = &DrawRecord> {
        self.commands.iter().filter_map(|command| match command {
            BackendCommand::Draw(record) => Some(record),
            _ => None,
        })
    }

    /// Number of offscreen targets still alive
    pub fn live_target_count(&self) -> usize {
        self.targets.len()
    }

    /// Resolution of a live target
    pub fn target_resolution(&self, target: RenderTargetHandle) -> Option<u32> {
        self.targets.get(&target).copied()
    }

    /// Description a material was created from
    pub fn material(&self, handle: MaterialHandle) -> Option<&MaterialDesc> {
        usize::try_from(handle.0).ok().and_then(|index| self.materials.get(index))
    }

    /// Name a mesh handle was registered under
    pub fn mesh_name(&self, handle: MeshHandle) -> Option<&str> {
        self.meshes
            .iter()
            .find(|(_, mesh)| **mesh == handle)
            .map(|(name, _)| name.as_str())
    }

    /// Currently bound target
    pub fn bound_target(&self) -> RenderTarget {
        self.bound_target
    }

    /// Current blend state
    pub fn blend_state(&self) -> BlendState {
        self.blend_state
    }

    /// Current depth function
    pub fn depth_func(&self) -> DepthFunc {
        self.depth_func
    }

    fn check_material(&self, material: MaterialHandle) -> BackendResult<()> {
        self.material(material)
            .map(|_| ())
            .ok_or_else(|| RenderError::BackendError(format!("unknown material {material:?}")))
    }
}

impl RenderBackend for RecordingBackend {
    fn create_depth_target(&mut self, resolution: u32) -> BackendResult<RenderTargetHandle> {
        if resolution == 0 || !resolution.is_power_of_two() {
            return Err(RenderError::InvalidShadowResolution(resolution));
        }

        let target = RenderTargetHandle(self.next_target_id);
        self.next_target_id += 1;
        self.targets.insert(target, resolution);
        self.commands.push(BackendCommand::CreateDepthTarget { target, resolution });
        log::trace!("Created depth target {:?} ({}x{})", target, resolution, resolution);
        Ok(target)
    }

    fn destroy_render_target(&mut self, target: RenderTargetHandle) -> BackendResult<()> {
        if self.targets.remove(&target).is_none() {
            return Err(RenderError::InvalidTarget(target));
        }
        if self.bound_target == RenderTarget::Offscreen(target) {
            self.bound_target = RenderTarget::Screen;
        }
        self.commands.push(BackendCommand::DestroyRenderTarget(target));
        Ok(())
    }

    fn bind_render_target(&mut self, target: RenderTarget) -> BackendResult<()> {
        if let RenderTarget::Offscreen(handle) = target {
            if !self.targets.contains_key(&handle) {
                return Err(RenderError::InvalidTarget(handle));
            }
        }
        self.bound_target = target;
        self.commands.push(BackendCommand::BindRenderTarget(target));
        Ok(())
    }

    fn set_clear_color(&mut self, color: [f32; 4]) {
        self.clear_color = color;
    }

    fn clear(&mut self, flags: ClearFlags) -> BackendResult<()> {
        self.commands.push(BackendCommand::Clear {
            target: self.bound_target,
            flags,
            color: self.clear_color,
        });
        Ok(())
    }

    fn set_depth_test(&mut self, func: DepthFunc) {
        self.depth_func = func;
        self.commands.push(BackendCommand::SetDepthTest(func));
    }

    fn set_blend_state(&mut self, state: BlendState) {
        self.blend_state = state;
        self.commands.push(BackendCommand::SetBlendState(state));
    }

    fn register_mesh(&mut self, name: &str) -> BackendResult<MeshHandle> {
        if let Some(handle) = self.meshes.get(name) {
            return Ok(*handle);
        }
        let handle = MeshHandle(self.meshes.len() as u64);
        self.meshes.insert(name.to_string(), handle);
        Ok(handle)
    }

    fn create_material(&mut self, desc: &MaterialDesc) -> BackendResult<MaterialHandle> {
        let handle = MaterialHandle(self.materials.len() as u64);
        self.materials.push(desc.clone());
        Ok(handle)
    }

    fn upload_draw_uniforms(&mut self, material: MaterialHandle, uniforms: &DrawUniforms) -> BackendResult<()> {
        self.check_material(material)?;
        self.material_uniforms.insert(material, *uniforms);
        self.commands.push(BackendCommand::UploadDrawUniforms {
            material,
            uniforms: *uniforms,
        });
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshHandle, material: MaterialHandle, transforms: &DrawTransforms) -> BackendResult<()> {
        self.check_material(material)?;
        self.commands.push(BackendCommand::Draw(DrawRecord {
            mesh,
            material,
            target: self.bound_target,
            blend: self.blend_state,
            uniforms: self.material_uniforms.get(&material).copied(),
            model: transforms.model,
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use crate::render::api::MaterialKind;

    fn emissive() -> MaterialDesc {
        MaterialDesc {
            kind: MaterialKind::Emissive { color: Vec3::new(1.0, 1.0, 1.0) },
            light_index: 0,
        }
    }

    #[test]
    fn test_depth_target_lifecycle() {
        let mut backend = RecordingBackend::new();
        let target = backend.create_depth_target(2048).unwrap();
        assert_eq!(backend.target_resolution(target), Some(2048));

        backend.bind_render_target(RenderTarget::Offscreen(target)).unwrap();
        backend.destroy_render_target(target).unwrap();

        assert_eq!(backend.live_target_count(), 0);
        assert_eq!(backend.bound_target(), RenderTarget::Screen);
        assert!(matches!(
            backend.bind_render_target(RenderTarget::Offscreen(target)),
            Err(RenderError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_rejects_non_power_of_two_targets() {
        let mut backend = RecordingBackend::new();
        assert!(matches!(
            backend.create_depth_target(1000),
            Err(RenderError::InvalidShadowResolution(1000))
        ));
    }

    #[test]
    fn test_draw_captures_state() {
        let mut backend = RecordingBackend::new();
        let mesh = backend.register_mesh("cube").unwrap();
        let material = backend.create_material(&emissive()).unwrap();

        let uniforms = DrawUniforms { alpha: 0.25, ..DrawUniforms::default() };
        backend.upload_draw_uniforms(material, &uniforms).unwrap();
        backend.set_blend_state(BlendState::ALPHA);
        backend
            .draw_mesh(
                mesh,
                material,
                &DrawTransforms {
                    model: Mat4::identity(),
                    view: Mat4::identity(),
                    projection: Mat4::identity(),
                },
            )
            .unwrap();

        let draw = backend.draws().next().unwrap();
        assert_eq!(draw.target, RenderTarget::Screen);
        assert!(draw.blend.is_enabled());
        assert_eq!(draw.uniforms.map(|u| u.alpha), Some(0.25));
        assert_eq!(backend.mesh_name(mesh), Some("cube"));
    }

    #[test]
    fn test_meshes_are_deduplicated_by_name() {
        let mut backend = RecordingBackend::new();
        let first = backend.register_mesh("mary").unwrap();
        let second = backend.register_mesh("mary").unwrap();
        let floor = backend.register_mesh("floor").unwrap();
        assert_eq!(first, second);
        assert_ne!(first, floor);
    }

    #[test]
    fn test_unknown_material_is_an_error() {
        let mut backend = RecordingBackend::new();
        let result = backend.upload_draw_uniforms(MaterialHandle(9), &DrawUniforms::default());
        assert!(matches!(result, Err(RenderError::BackendError(_))));
    }
}
