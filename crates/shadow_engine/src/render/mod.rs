//! # Rendering System
//!
//! The multi-light shadow-mapping render loop and the seams it drives.
//!
//! ## Architecture
//!
//! - **Renderer**: owns lights and drawables, runs the per-frame shadow and lit passes
//! - **ShadowLight**: orbiting directional light with its own depth target
//! - **Drawable**: a transform plus camera-pass and shadow-pass renderables
//! - **RenderBackend**: the graphics-API binding, implemented outside the core
//!   (a headless [`RecordingBackend`](backends::RecordingBackend) ships with the crate)

pub mod api;
pub mod backends;
pub mod drawable;
pub mod light;
pub mod primitives;
pub mod renderer;


pub use api::{
    BackendResult, BlendFactor, BlendState, ClearFlags, DepthFunc, DrawTransforms, DrawUniforms, MaterialDesc,
    MaterialHandle, MaterialKind, MeshHandle, RenderBackend, RenderTarget, RenderTargetHandle,
};
pub use drawable::{BackendMesh, Drawable, DrawableId, LightId, LightMarker, MeshRenderable};
pub use light::{LightProjection, ShadowLight};
pub use primitives::Camera;
pub use renderer::{FrameStats, Renderer};

use thiserror::Error;

/// Errors raised by the render loop and its backends
#[derive(Error, Debug)]
pub enum RenderError {
    /// A frame was requested with no light registered
    ///
    /// Fatal: a scene without a light source has no defined shading result.
    #[error("No light source: at least one light must be registered before rendering")]
    NoLightSource,

    /// A light handle didn't name a registered light
    #[error("Unknown light index {0}")]
    UnknownLight(usize),

    /// An offscreen target handle was unknown or already destroyed
    #[error("Invalid render target {0:?}")]
    InvalidTarget(RenderTargetHandle),

    /// Shadow map size unsupported by the backend
    #[error("Invalid shadow map resolution {0}: must be a power of two")]
    InvalidShadowResolution(u32),

    /// Scene description failed validation
    #[error("Invalid scene: {0}")]
    InvalidScene(String),

    /// GPU resource creation failed
    #[error("Resource creation failed: {0}")]
    ResourceCreationFailed(String),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    BackendError(String),
}

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;
