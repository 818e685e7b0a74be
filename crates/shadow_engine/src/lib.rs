//! # Shadow Engine
//!
//! A multi-light shadow-mapping renderer. Every light renders its own depth
//! map and then contributes one additive pass to the camera framebuffer;
//! lights orbit their focal point with a randomized wobble and bounce off a
//! minimum height.
//!
//! ## Features
//!
//! - **Per-light shadow maps**: one depth target per light, refreshed each frame
//! - **Additive multi-light compositing**: opaque base pass, blended `1/N` passes
//! - **Light affinity**: each object is lit and shadowed by one assigned light
//! - **Backend seam**: the graphics API lives behind [`render::RenderBackend`]
//! - **Scene files**: TOML or RON scene descriptions
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use shadow_engine::prelude::*;
//!
//! struct Idle;
//!
//! impl Application<RecordingBackend> for Idle {
//!     fn initialize(&mut self, _engine: &mut Engine<RecordingBackend>) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn update(&mut self, _engine: &mut Engine<RecordingBackend>, _delta_time: f32) -> Result<(), AppError> {
//!         Ok(())
//!     }
//!
//!     fn cleanup(&mut self, _engine: &mut Engine<RecordingBackend>) {}
//! }
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (mut engine, _) = Engine::from_scene(RecordingBackend::new(), &SceneConfig::default())?;
//!     engine.run(&mut Idle, &mut FixedRateScheduler::new(60.0, Some(120)))?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]

pub mod config;
pub mod core;
pub mod foundation;
pub mod render;
pub mod scene;

mod application;
mod engine;

pub use application::{AppError, Application};
pub use engine::{Engine, EngineError, FixedRateScheduler, FrameScheduler, RunSummary, WallClockScheduler};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError},
        core::{CameraConfig, LightConfig, ObjectConfig, RendererConfig, SceneConfig},
        foundation::{
            math::{Mat4, Transform, Vec3},
            time::{FrameClock, FrameTiming, Timer},
        },
        render::{
            backends::RecordingBackend, Camera, Drawable, FrameStats, LightMarker, MeshRenderable, RenderBackend,
            RenderError, Renderer, ShadowLight,
        },
        scene::{build_renderer, load_scene, SceneHandles},
        AppError, Application, Engine, EngineError, FixedRateScheduler, FrameScheduler, RunSummary,
        WallClockScheduler,
    };
}
