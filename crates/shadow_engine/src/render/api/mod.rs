//! Public rendering API
//!
//! The backend trait the render loop drives and the strongly-typed data that
//! crosses it.

pub mod render_backend;
pub mod uniforms;

// Re-export commonly used types
pub use render_backend::{
    BackendResult, BlendFactor, BlendState, ClearFlags, DepthFunc, DrawTransforms, MaterialDesc,
    MaterialHandle, MaterialKind, MeshHandle, RenderBackend, RenderTarget, RenderTargetHandle,
};
pub use uniforms::DrawUniforms;
