//! Application trait and lifecycle management

use crate::engine::{Engine, EngineError};
use crate::render::{FrameStats, RenderBackend};
use thiserror::Error;

/// Application lifecycle trait
///
/// Implement this trait to drive a scene through the engine's frame loop.
pub trait Application<B: RenderBackend> {
    /// Initialize the application
    ///
    /// Called once before the first frame. Use this to register lights and
    /// drawables if the engine wasn't built from a scene description.
    fn initialize(&mut self, engine: &mut Engine<B>) -> Result<(), AppError>;

    /// Update the application
    ///
    /// Called every frame before rendering.
    ///
    /// # Arguments
    /// * `engine` - Mutable reference to the engine
    /// * `delta_time` - Time since last frame in seconds
    fn update(&mut self, engine: &mut Engine<B>, delta_time: f32) -> Result<(), AppError>;

    /// Inspect a rendered frame
    ///
    /// Called after every successful frame with that frame's statistics.
    fn after_frame(&mut self, _engine: &mut Engine<B>, _stats: &FrameStats) -> Result<(), AppError> {
        Ok(())
    }

    /// Cleanup the application
    ///
    /// Called once when the frame loop ends, also after a fatal render error.
    fn cleanup(&mut self, engine: &mut Engine<B>);
}

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Engine error propagated to application level
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// Custom application error
    #[error("Application error: {0}")]
    Custom(String),
}
