//! Backend abstraction traits for the rendering system
//!
//! This module defines the trait that graphics-API bindings implement so the
//! multi-light render loop can drive them without knowing which API sits
//! underneath. Every state change the loop depends on (target binding,
//! clearing, depth test, blending) is an explicit call.

use bitflags::bitflags;

use crate::foundation::math::{Mat4, Vec3};
use crate::render::RenderError;

use super::uniforms::DrawUniforms;

/// Result type for backend operations
pub type BackendResult<T> = Result<T, RenderError>;

/// Handle to a mesh resource stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MeshHandle(pub u64);

/// Handle to a material (shader program + parameters) stored in the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialHandle(pub u64);

/// Handle to an offscreen render target (a light's depth framebuffer)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderTargetHandle(pub u64);

/// Framebuffer selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderTarget {
    /// The camera's presentation framebuffer
    Screen,
    /// An offscreen target created by the backend
    Offscreen(RenderTargetHandle),
}

bitflags! {
    /// Buffers affected by a clear
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ClearFlags: u32 {
        /// Colour attachment
        const COLOR = 1 << 0;
        /// Depth attachment
        const DEPTH = 1 << 1;
    }
}

/// Depth comparison function
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DepthFunc {
    /// Depth testing disabled
    Disabled,
    /// Pass when the incoming fragment is strictly nearer
    Less,
    /// Pass when the incoming fragment is nearer or equal
    LessEqual,
}

/// Blend factor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendFactor {
    /// 1
    One,
    /// 0
    Zero,
    /// Source alpha
    SrcAlpha,
    /// 1 - source alpha
    OneMinusSrcAlpha,
}

/// Fixed-function blend state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendState {
    /// Opaque writes
    Disabled,
    /// `dst = src * src_factor + dst * dst_factor`
    Enabled {
        /// Factor applied to the incoming fragment
        src: BlendFactor,
        /// Factor applied to the framebuffer contents
        dst: BlendFactor,
    },
}

impl BlendState {
    /// Standard `SRC_ALPHA, ONE_MINUS_SRC_ALPHA` blending
    pub const ALPHA: Self = Self::Enabled {
        src: BlendFactor::SrcAlpha,
        dst: BlendFactor::OneMinusSrcAlpha,
    };

    /// Whether blending is on
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled { .. })
    }
}

/// Shader family of a material
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialKind {
    /// Blinn-Phong shading that samples one light's shadow map
    Phong {
        /// Radiance of the light (colour * intensity)
        light_radiance: Vec3,
        /// Shadow map sampled by the shader
        shadow_map: RenderTargetHandle,
    },
    /// Depth-only material that writes into a light's shadow map
    Shadow {
        /// Target receiving the depth
        target: RenderTargetHandle,
    },
    /// Unlit colour, used for light markers
    Emissive {
        /// Emitted colour
        color: Vec3,
    },
}

/// Everything a backend needs to build a material
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialDesc {
    /// Shader family and its fixed parameters
    pub kind: MaterialKind,
    /// Light whose passes use this material
    pub light_index: usize,
}

/// Camera context for a draw call
#[derive(Debug, Clone, PartialEq)]
pub struct DrawTransforms {
    /// Object model matrix
    pub model: Mat4,
    /// Camera view matrix
    pub view: Mat4,
    /// Camera projection matrix
    pub projection: Mat4,
}

/// Main rendering backend trait
///
/// Implementations wrap a concrete graphics API. The render loop assumes
/// state persists between calls: a bound target stays bound and a blend
/// state stays active until changed.
pub trait RenderBackend {
    /// Create a square depth-capable offscreen target
    fn create_depth_target(&mut self, resolution: u32) -> BackendResult<RenderTargetHandle>;

    /// Release an offscreen target
    fn destroy_render_target(&mut self, target: RenderTargetHandle) -> BackendResult<()>;

    /// Make `target` the destination of subsequent clears and draws
    fn bind_render_target(&mut self, target: RenderTarget) -> BackendResult<()>;

    /// Colour used by the next colour clear
    fn set_clear_color(&mut self, color: [f32; 4]);

    /// Clear buffers of the bound target
    fn clear(&mut self, flags: ClearFlags) -> BackendResult<()>;

    /// Configure depth testing
    fn set_depth_test(&mut self, func: DepthFunc);

    /// Configure blending
    fn set_blend_state(&mut self, state: BlendState);

    /// Resolve a mesh asset by name
    fn register_mesh(&mut self, name: &str) -> BackendResult<MeshHandle>;

    /// Build a material
    fn create_material(&mut self, desc: &MaterialDesc) -> BackendResult<MaterialHandle>;

    /// Upload per-draw uniforms into a material
    fn upload_draw_uniforms(&mut self, material: MaterialHandle, uniforms: &DrawUniforms) -> BackendResult<()>;

    /// Draw a mesh with a material into the bound target
    fn draw_mesh(&mut self, mesh: MeshHandle, material: MaterialHandle, transforms: &DrawTransforms) -> BackendResult<()>;
}
