//! Shadow demo application
//!
//! Runs a multi-light shadow scene through the headless recording backend
//! and reports what the render loop did. Without `--scene` the built-in
//! three-light scene is used.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command};
use shadow_engine::foundation::logging::{self, LevelFilter};
use shadow_engine::prelude::*;

const DEFAULT_FRAMES: &str = "600";
const DEFAULT_FPS: &str = "60";

#[derive(Debug)]
struct DemoConfig {
    scene: Option<PathBuf>,
    frames: u64,
    fps: f64,
    seed: Option<u64>,
    width: u32,
    height: u32,
    realtime: bool,
}

/// Logs per-second statistics and keeps the recording backend drained
struct DemoApp {
    timer: Timer,
    report_every: u64,
    window: FrameStats,
    commands_seen: usize,
}

impl DemoApp {
    fn new(fps: f64) -> Self {
        Self {
            timer: Timer::new(),
            report_every: fps.round().max(1.0) as u64,
            window: FrameStats::default(),
            commands_seen: 0,
        }
    }
}

impl Application<RecordingBackend> for DemoApp {
    fn initialize(&mut self, engine: &mut Engine<RecordingBackend>) -> Result<(), AppError> {
        let renderer = engine.renderer();
        log::info!(
            "Demo starting: {} lights, {} drawables, camera at {:?}",
            renderer.light_count(),
            renderer.drawables().len(),
            engine.camera().position
        );
        for (index, light) in renderer.lights().enumerate() {
            log::debug!(
                "Light {}: position {:?}, speed {} deg/s, shadow map {}x{}",
                index,
                light.position(),
                light.speed(),
                light.resolution(),
                light.resolution()
            );
        }
        Ok(())
    }

    fn update(&mut self, _engine: &mut Engine<RecordingBackend>, _delta_time: f32) -> Result<(), AppError> {
        self.timer.update();
        Ok(())
    }

    fn after_frame(&mut self, engine: &mut Engine<RecordingBackend>, stats: &FrameStats) -> Result<(), AppError> {
        self.commands_seen += engine.renderer_mut().backend_mut().take_commands().len();
        self.window += *stats;

        let frame = engine.renderer().frame_count();
        if frame % self.report_every == 0 {
            let positions: Vec<_> = engine
                .renderer()
                .lights()
                .map(|light| {
                    let p = light.position();
                    format!("({:.1}, {:.1}, {:.1})", p.x, p.y, p.z)
                })
                .collect();
            log::info!(
                "Frame {}: {} shadow / {} lit / {} marker draws, {} bounces, {:.0} fps; lights at {}",
                frame,
                self.window.shadow_draws,
                self.window.lit_draws,
                self.window.marker_draws,
                self.window.bounces,
                self.timer.average_fps(),
                positions.join(", ")
            );
            self.window = FrameStats::default();
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine<RecordingBackend>) {
        log::info!(
            "Demo finished: {} frames, {} backend commands recorded",
            engine.renderer().frame_count(),
            self.commands_seen
        );
    }
}

fn required<'a>(matches: &'a ArgMatches, name: &str) -> Result<&'a String> {
    matches
        .get_one::<String>(name)
        .with_context(|| format!("Missing value for --{name}"))
}

fn parse_args() -> Result<(DemoConfig, LevelFilter)> {
    let matches = Command::new("shadow_demo")
        .about("Runs a multi-light shadow-mapping scene headlessly and reports render statistics")
        .arg(
            Arg::new("scene")
                .short('s')
                .long("scene")
                .value_name("FILE")
                .help("Scene description (.toml or .ron); defaults to the built-in scene"),
        )
        .arg(
            Arg::new("frames")
                .short('n')
                .long("frames")
                .value_name("COUNT")
                .help("Number of frames to render")
                .default_value(DEFAULT_FRAMES),
        )
        .arg(
            Arg::new("fps")
                .long("fps")
                .value_name("HZ")
                .help("Simulated frame rate")
                .default_value(DEFAULT_FPS),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .value_name("SEED")
                .help("Seed for the light wobble (overrides the scene file)"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .value_name("PIXELS")
                .help("Framebuffer width")
                .default_value("1280"),
        )
        .arg(
            Arg::new("height")
                .long("height")
                .value_name("PIXELS")
                .help("Framebuffer height")
                .default_value("720"),
        )
        .arg(
            Arg::new("realtime")
                .long("realtime")
                .help("Pace frames against the wall clock instead of simulated time")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (error, warn, info, debug, trace)")
                .default_value("info"),
        )
        .get_matches();

    let config = DemoConfig {
        scene: matches.get_one::<String>("scene").map(PathBuf::from),
        frames: required(&matches, "frames")?.parse().context("Invalid frame count")?,
        fps: required(&matches, "fps")?.parse().context("Invalid frame rate")?,
        seed: matches
            .get_one::<String>("seed")
            .map(|seed| seed.parse::<u64>())
            .transpose()
            .context("Invalid seed")?,
        width: required(&matches, "width")?.parse().context("Invalid width")?,
        height: required(&matches, "height")?.parse().context("Invalid height")?,
        realtime: matches.get_flag("realtime"),
    };
    let level_name = required(&matches, "log-level")?;
    let level = level_name
        .parse::<LevelFilter>()
        .map_err(|_| anyhow::anyhow!("Invalid log level '{level_name}'"))?;

    Ok((config, level))
}

fn main() -> Result<()> {
    let (config, level) = parse_args()?;
    logging::init_with_level(level);

    if config.fps <= 0.0 {
        anyhow::bail!("Frame rate must be positive, got {}", config.fps);
    }

    let mut scene = match &config.scene {
        Some(path) => SceneConfig::load_from_file(path)
            .with_context(|| format!("Failed to load scene {}", path.display()))?,
        None => {
            log::info!("No scene file given, using the built-in three-light scene");
            SceneConfig::default()
        }
    };
    if let Some(seed) = config.seed {
        scene.renderer.rng_seed = Some(seed);
    }

    let (mut engine, handles) =
        Engine::from_scene(RecordingBackend::new(), &scene).context("Failed to build scene")?;
    engine.handle_resize(config.width, config.height);

    let mut app = DemoApp::new(config.fps);
    let summary = if config.realtime {
        engine.run(&mut app, &mut WallClockScheduler::new(config.fps, Some(config.frames)))
    } else {
        engine.run(&mut app, &mut FixedRateScheduler::new(config.fps, Some(config.frames)))
    }
    .context("Render loop failed")?;

    let renderer = engine.shutdown().context("Failed to release render targets")?;

    println!("Rendered {} frames", summary.frames);
    println!("  Lights:          {}", handles.lights.len());
    println!("  Objects:         {}", handles.drawables.len());
    println!("  Shadow draws:    {}", summary.totals.shadow_draws);
    println!("  Lit draws:       {}", summary.totals.lit_draws);
    println!("  Marker draws:    {}", summary.totals.marker_draws);
    println!("  Blended passes:  {}", summary.totals.blended_passes);
    println!("  Light bounces:   {}", summary.totals.bounces);
    for (index, light) in renderer.lights().enumerate() {
        let p = light.position();
        println!(
            "  Light {index} final position: ({:.2}, {:.2}, {:.2}), speed {:.1}",
            p.x,
            p.y,
            p.z,
            light.speed()
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const SCENE: &str = include_str!("../scenes/three_lights.toml");

    #[test]
    fn test_bundled_scene_runs() {
        let scene = SceneConfig::from_str_for_path(SCENE, Path::new("three_lights.toml")).unwrap();
        assert_eq!(scene.lights.len(), 3);
        assert_eq!(scene.objects[0].instance_count, 12);

        let (mut engine, _) = Engine::from_scene(RecordingBackend::new(), &scene).unwrap();
        let mut app = DemoApp::new(60.0);
        let summary = engine
            .run(&mut app, &mut FixedRateScheduler::new(60.0, Some(60)))
            .unwrap();

        assert_eq!(summary.frames, 60);
        assert_eq!(summary.totals.lit_draws, 180);
        assert_eq!(summary.totals.blended_passes, 120);
        assert!(app.commands_seen > 0);
        assert!(engine.renderer().backend().commands().is_empty());
    }
}
