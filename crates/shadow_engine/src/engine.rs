//! Core engine implementation
//!
//! The engine owns the renderer and the camera and turns timestamps from an
//! external tick source into rendered frames. It never sleeps or polls a
//! window itself; pacing belongs to the [`FrameScheduler`].

use std::time::{Duration, Instant};

use thiserror::Error;

use crate::application::{AppError, Application};
use crate::config::ConfigError;
use crate::core::SceneConfig;
use crate::foundation::time::FrameClock;
use crate::render::{Camera, FrameStats, RenderBackend, RenderError, Renderer};
use crate::scene::{self, SceneHandles};

/// Source of frame timestamps
///
/// Each call yields the monotonic time of the next frame in milliseconds, or
/// `None` once no more frames will come.
pub trait FrameScheduler {
    /// Wait for and return the next frame timestamp
    fn next_frame(&mut self) -> Option<f64>;
}

/// Evenly spaced synthetic timestamps, for headless runs and tests
///
/// The first frame lands one interval after zero, so with the engine's clock
/// starting at zero every frame reports the same delta.
#[derive(Debug, Clone)]
pub struct FixedRateScheduler {
    interval_ms: f64,
    next_ms: f64,
    remaining: Option<u64>,
}

impl FixedRateScheduler {
    /// `fps` frames per simulated second, `frame_limit` frames in total
    /// (`None` runs until the application quits)
    pub fn new(fps: f64, frame_limit: Option<u64>) -> Self {
        let interval_ms = if fps > 0.0 { 1000.0 / fps } else { 0.0 };
        Self {
            interval_ms,
            next_ms: interval_ms,
            remaining: frame_limit,
        }
    }

    /// Milliseconds between frames
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }
}

impl FrameScheduler for FixedRateScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        let now = self.next_ms;
        self.next_ms += self.interval_ms;
        Some(now)
    }
}

/// Wall-clock timestamps paced to a target rate
#[derive(Debug)]
pub struct WallClockScheduler {
    start: Instant,
    interval: Duration,
    next_deadline: Instant,
    remaining: Option<u64>,
}

impl WallClockScheduler {
    /// Pace to `fps`; a non-positive rate disables pacing
    pub fn new(fps: f64, frame_limit: Option<u64>) -> Self {
        let interval = if fps > 0.0 {
            Duration::from_secs_f64(1.0 / fps)
        } else {
            Duration::ZERO
        };
        let start = Instant::now();
        Self {
            start,
            interval,
            next_deadline: start + interval,
            remaining: frame_limit,
        }
    }
}

impl FrameScheduler for WallClockScheduler {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(remaining) = self.remaining.as_mut() {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }

        let now = Instant::now();
        if now < self.next_deadline {
            std::thread::sleep(self.next_deadline - now);
        }
        self.next_deadline += self.interval;
        Some(self.start.elapsed().as_secs_f64() * 1000.0)
    }
}

/// Totals of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames rendered
    pub frames: u64,
    /// Summed per-frame statistics
    pub totals: FrameStats,
}

/// Main engine struct
///
/// Coordinates the renderer, the camera and frame timing for an
/// [`Application`].
pub struct Engine<B: RenderBackend> {
    renderer: Renderer<B>,
    camera: Camera,
    clock: FrameClock,
    running: bool,
}

impl<B: RenderBackend> Engine<B> {
    /// Create an engine around an already populated renderer
    pub fn new(renderer: Renderer<B>, camera: Camera) -> Self {
        log::info!("Initializing engine with {} lights", renderer.light_count());
        Self {
            renderer,
            camera,
            clock: FrameClock::new(),
            running: true,
        }
    }

    /// Build the renderer, camera and scene from a scene description
    pub fn from_scene(backend: B, config: &SceneConfig) -> Result<(Self, SceneHandles), EngineError> {
        let (renderer, handles) = scene::build_renderer(backend, config)?;
        let camera = Camera::from_config(&config.camera);
        Ok((Self::new(renderer, camera), handles))
    }

    /// Run the frame loop until the application quits or the scheduler ends
    ///
    /// One frame is rendered per scheduler tick. A render error is fatal: it
    /// is logged, the loop stops, the application is cleaned up and the error
    /// is returned.
    pub fn run<A, S>(&mut self, app: &mut A, scheduler: &mut S) -> Result<RunSummary, EngineError>
    where
        A: Application<B>,
        S: FrameScheduler + ?Sized,
    {
        app.initialize(self)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {e}")))?;

        log::info!("Starting frame loop...");
        self.running = true;
        let mut summary = RunSummary::default();

        let result = loop {
            if !self.running {
                break Ok(());
            }
            let Some(now_ms) = scheduler.next_frame() else {
                log::debug!("Scheduler finished after {} frames", summary.frames);
                break Ok(());
            };

            let timing = self.clock.tick(now_ms);
            if let Err(e) = app.update(self, timing.delta_time) {
                break Err(EngineError::ApplicationError(format!("App update: {e}")));
            }

            let stats = match self.renderer.render_frame(&self.camera, timing) {
                Ok(stats) => stats,
                Err(e) => {
                    log::error!("Fatal render error on frame {}: {}", summary.frames, e);
                    break Err(EngineError::Render(e));
                }
            };
            summary.frames += 1;
            summary.totals += stats;

            if let Err(e) = app.after_frame(self, &stats) {
                break Err(EngineError::ApplicationError(format!("App frame hook: {e}")));
            }
        };

        self.running = false;
        app.cleanup(self);

        log::info!("Engine stopped after {} frames", summary.frames);
        result.map(|()| summary)
    }

    /// Framebuffer resize: keep the camera's aspect ratio in sync
    ///
    /// Zero-sized framebuffers (minimized windows) are ignored.
    pub fn handle_resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            log::debug!("Ignoring resize to {}x{}", width, height);
            return;
        }
        self.camera.set_aspect_ratio(width as f32 / height as f32);
    }

    /// Request engine shutdown after the current frame
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the frame loop is still going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Get the renderer
    pub fn renderer(&self) -> &Renderer<B> {
        &self.renderer
    }

    /// Get mutable access to the renderer
    pub fn renderer_mut(&mut self) -> &mut Renderer<B> {
        &mut self.renderer
    }

    /// Get the camera
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Get mutable access to the camera
    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.camera
    }

    /// Ticks processed by the frame clock
    pub fn frame_count(&self) -> u64 {
        self.clock.frame_count()
    }

    /// Release renderer resources and give back the renderer
    pub fn shutdown(mut self) -> Result<Renderer<B>, EngineError> {
        self.renderer.shutdown()?;
        Ok(self.renderer)
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Rendering error; fatal for the frame loop
    #[error("Rendering error: {0}")]
    Render(#[from] RenderError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}

impl From<AppError> for EngineError {
    fn from(error: AppError) -> Self {
        match error {
            AppError::Engine(inner) => inner,
            other => Self::ApplicationError(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::RendererConfig;
    use crate::render::backends::RecordingBackend;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct CountingApp {
        quit_after: Option<u64>,
        deltas: Vec<f32>,
        frames_seen: u64,
        initialized: bool,
        cleaned_up: bool,
    }

    impl Application<RecordingBackend> for CountingApp {
        fn initialize(&mut self, _engine: &mut Engine<RecordingBackend>) -> Result<(), AppError> {
            self.initialized = true;
            Ok(())
        }

        fn update(&mut self, _engine: &mut Engine<RecordingBackend>, delta_time: f32) -> Result<(), AppError> {
            self.deltas.push(delta_time);
            Ok(())
        }

        fn after_frame(&mut self, engine: &mut Engine<RecordingBackend>, _stats: &FrameStats) -> Result<(), AppError> {
            self.frames_seen += 1;
            engine.renderer_mut().backend_mut().take_commands();
            if Some(self.frames_seen) == self.quit_after {
                engine.quit();
            }
            Ok(())
        }

        fn cleanup(&mut self, _engine: &mut Engine<RecordingBackend>) {
            self.cleaned_up = true;
        }
    }

    fn seeded_engine() -> Engine<RecordingBackend> {
        let mut config = SceneConfig::default();
        config.renderer = RendererConfig::default().with_seed(9);
        Engine::from_scene(RecordingBackend::new(), &config).unwrap().0
    }

    #[test]
    fn test_fixed_rate_scheduler() {
        let mut scheduler = FixedRateScheduler::new(50.0, Some(3));
        assert_relative_eq!(scheduler.interval_ms(), 20.0);
        assert_eq!(scheduler.next_frame(), Some(20.0));
        assert_eq!(scheduler.next_frame(), Some(40.0));
        assert_eq!(scheduler.next_frame(), Some(60.0));
        assert_eq!(scheduler.next_frame(), None);
    }

    #[test]
    fn test_run_until_scheduler_ends() {
        let mut engine = seeded_engine();
        let mut app = CountingApp::default();
        let summary = engine.run(&mut app, &mut FixedRateScheduler::new(60.0, Some(10))).unwrap();

        assert!(app.initialized && app.cleaned_up);
        assert_eq!(summary.frames, 10);
        assert_eq!(summary.totals.lit_draws, 30);
        assert_eq!(summary.totals.blended_passes, 20);
        assert_eq!(app.deltas.len(), 10);
        for delta in &app.deltas {
            assert_relative_eq!(*delta, 1.0 / 60.0, epsilon = 1e-6);
        }
        assert!(!engine.is_running());
    }

    #[test]
    fn test_quit_stops_the_loop() {
        let mut engine = seeded_engine();
        let mut app = CountingApp {
            quit_after: Some(4),
            ..CountingApp::default()
        };
        let summary = engine.run(&mut app, &mut FixedRateScheduler::new(60.0, None)).unwrap();
        assert_eq!(summary.frames, 4);
        assert_eq!(engine.frame_count(), 4);
    }

    #[test]
    fn test_missing_light_is_fatal() {
        let renderer = Renderer::new(RecordingBackend::new(), RendererConfig::default());
        let mut engine = Engine::new(renderer, Camera::default());
        let mut app = CountingApp::default();

        let result = engine.run(&mut app, &mut FixedRateScheduler::new(60.0, Some(10)));
        assert!(matches!(result, Err(EngineError::Render(RenderError::NoLightSource))));
        assert_eq!(app.deltas.len(), 1);
        assert_eq!(app.frames_seen, 0);
        assert!(app.cleaned_up);
    }

    #[test]
    fn test_handle_resize_updates_aspect() {
        let mut engine = seeded_engine();
        engine.handle_resize(800, 400);
        assert_relative_eq!(engine.camera().aspect, 2.0);

        engine.handle_resize(0, 400);
        assert_relative_eq!(engine.camera().aspect, 2.0);
    }

    #[test]
    fn test_shutdown_releases_targets() {
        let engine = seeded_engine();
        let renderer = engine.shutdown().unwrap();
        assert_eq!(renderer.backend().live_target_count(), 0);
    }

    #[test]
    fn test_app_error_unwraps_engine_error() {
        let error: EngineError = AppError::Engine(EngineError::Render(RenderError::NoLightSource)).into();
        assert!(matches!(error, EngineError::Render(RenderError::NoLightSource)));

        let error: EngineError = AppError::Custom("boom".into()).into();
        assert!(matches!(error, EngineError::ApplicationError(_)));
    }
}
