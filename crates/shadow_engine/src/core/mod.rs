//! # Core Engine Module
//!
//! Shared configuration types used by the renderer, the scene loader and
//! applications.

pub mod config;

pub use config::{
    AnimationConfig,
    CameraConfig,
    LightConfig,
    ObjectConfig,
    ProjectionConfig,
    RendererConfig,
    SceneConfig,
};
