//! Graphics backend implementations
//!
//! Concrete graphics-API bindings live behind [`RenderBackend`](crate::render::RenderBackend).
//! The recording backend runs headless and is what the demo and the tests drive.

pub mod recording;

pub use recording::{BackendCommand, DrawRecord, RecordingBackend};
