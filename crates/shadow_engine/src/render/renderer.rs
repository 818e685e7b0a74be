//! Multi-light shadow-mapping render loop
//!
//! Each frame the renderer walks its lights in registration order. For light
//! `l` it refreshes that light's shadow map from the drawables bound to `l`,
//! then draws those drawables into the camera framebuffer. Light 0 draws
//! opaque and lays down the base image; every later light blends on top with
//! a per-draw alpha of `1 / N`.
//!
//! Each drawable belongs to exactly one light's passes (its `light_index`).
//! Objects therefore receive light and shadow from their assigned light only,
//! which keeps a frame at O(lights + objects) draws.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::core::RendererConfig;
use crate::foundation::math::utils;
use crate::foundation::time::FrameTiming;
use crate::render::api::{BlendState, ClearFlags, DepthFunc, DrawUniforms, RenderBackend, RenderTarget};
use crate::render::drawable::{Drawable, DrawableId, LightId, LightMarker};
use crate::render::light::ShadowLight;
use crate::render::primitives::Camera;
use crate::render::{RenderError, RenderResult};

/// What one frame did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Draws issued into shadow maps
    pub shadow_draws: usize,
    /// Object draws issued into the camera framebuffer
    pub lit_draws: usize,
    /// Light marker draws
    pub marker_draws: usize,
    /// Light passes that ran with blending enabled
    pub blended_passes: usize,
    /// Lights that hit their floor and reversed
    pub bounces: usize,
}

impl std::ops::AddAssign for FrameStats {
    fn add_assign(&mut self, other: Self) {
        self.shadow_draws += other.shadow_draws;
        self.lit_draws += other.lit_draws;
        self.marker_draws += other.marker_draws;
        self.blended_passes += other.blended_passes;
        self.bounces += other.bounces;
    }
}

#[derive(Debug)]
struct LightEntry {
    light: ShadowLight,
    marker: Option<LightMarker>,
}

/// Owns the scene's lights and drawables and renders them through `B`
pub struct Renderer<B: RenderBackend> {
    backend: B,
    config: RendererConfig,
    lights: Vec<LightEntry>,
    drawables: Vec<Drawable>,
    rng: StdRng,
    frame_count: u64,
}

impl<B: RenderBackend> Renderer<B> {
    /// Create an empty renderer
    pub fn new(backend: B, config: RendererConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        log::info!(
            "Renderer created (default shadow map {}x{}, seed {:?})",
            config.shadow_map_resolution,
            config.shadow_map_resolution,
            config.rng_seed
        );

        Self {
            backend,
            config,
            lights: Vec::new(),
            drawables: Vec::new(),
            rng,
            frame_count: 0,
        }
    }

    /// Register a light and allocate its depth target
    ///
    /// Registration order is pass order; the first light is the base pass.
    pub fn add_light(&mut self, mut light: ShadowLight) -> RenderResult<LightId> {
        let target = self.backend.create_depth_target(light.resolution())?;
        light.set_shadow_target(Some(target));

        let id = LightId(self.lights.len());
        log::info!(
            "Registered light {} at {:?} (shadow map {}x{}, shadows {})",
            id.0,
            light.position(),
            light.resolution(),
            light.resolution(),
            if light.casts_shadows() { "on" } else { "off" }
        );
        self.lights.push(LightEntry { light, marker: None });
        Ok(id)
    }

    /// Attach a visual marker that follows light `id`
    pub fn attach_light_marker(&mut self, id: LightId, marker: LightMarker) -> RenderResult<()> {
        let entry = self.lights.get_mut(id.0).ok_or(RenderError::UnknownLight(id.0))?;
        let mut marker = marker;
        marker.follow(entry.light.position());
        entry.marker = Some(marker);
        Ok(())
    }

    /// Register a drawable; returns its handle
    ///
    /// The drawable's light must already be registered.
    pub fn add_drawable(&mut self, drawable: Drawable) -> RenderResult<DrawableId> {
        if drawable.light_index >= self.lights.len() {
            log::warn!(
                "Rejected drawable '{}': light {} is not registered ({} lights)",
                drawable.name,
                drawable.light_index,
                self.lights.len()
            );
            return Err(RenderError::UnknownLight(drawable.light_index));
        }

        let id = DrawableId(self.drawables.len());
        log::debug!(
            "Registered drawable '{}' for light {} (lit: {}, shadow: {})",
            drawable.name,
            drawable.light_index,
            drawable.is_camera_visible(),
            drawable.casts_shadow()
        );
        self.drawables.push(drawable);
        Ok(id)
    }

    /// Render one frame
    ///
    /// Fails with [`RenderError::NoLightSource`] when no light is registered;
    /// callers must treat that as fatal. Backend errors propagate unchanged.
    pub fn render_frame(&mut self, camera: &Camera, timing: FrameTiming) -> RenderResult<FrameStats> {
        if self.lights.is_empty() {
            log::error!("No light source registered; refusing to render frame {}", self.frame_count);
            return Err(RenderError::NoLightSource);
        }

        let delta_time = timing.delta_time;
        self.animate_drawables(delta_time);

        let backend: &mut dyn RenderBackend = &mut self.backend;
        backend.bind_render_target(RenderTarget::Screen)?;
        backend.set_clear_color(self.config.clear_color);
        backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH)?;
        backend.set_depth_test(DepthFunc::LessEqual);
        // The base pass must not inherit blending from an aborted frame
        backend.set_blend_state(BlendState::Disabled);

        let light_count = self.lights.len();
        let alpha = 1.0 / light_count as f32;
        let mut stats = FrameStats::default();

        for (index, entry) in self.lights.iter_mut().enumerate() {
            let Some(shadow_target) = entry.light.shadow_target() else {
                return Err(RenderError::ResourceCreationFailed(format!("light {index} has no shadow target")));
            };

            // Shadow map: white means "unoccluded" outside the rendered area
            backend.bind_render_target(RenderTarget::Offscreen(shadow_target))?;
            backend.set_clear_color(self.config.shadow_clear_color);
            backend.clear(ClearFlags::COLOR | ClearFlags::DEPTH)?;

            if entry.light.advance(delta_time, &mut self.rng) {
                stats.bounces += 1;
            }
            let light = &entry.light;
            if let Some(marker) = entry.marker.as_mut() {
                marker.follow(light.position());
            }

            if light.casts_shadows() {
                for drawable in self
                    .drawables
                    .iter_mut()
                    .filter(|d| d.light_index == index && d.casts_shadow())
                {
                    let uniforms = DrawUniforms::new(&light.light_space_matrix(&drawable.transform), &light.position(), 1.0);
                    let model = drawable.transform.to_matrix();
                    if let Some(shadow) = drawable.shadow_mut() {
                        shadow.draw(backend, camera, &model, &uniforms)?;
                        stats.shadow_draws += 1;
                    }
                }
            }

            backend.bind_render_target(RenderTarget::Screen)?;

            // Markers are opaque in every pass
            if let Some(marker) = entry.marker.as_mut() {
                let uniforms = DrawUniforms::new(&light.light_space_matrix(&marker.transform), &light.position(), 1.0);
                let model = marker.transform.to_matrix();
                marker.renderable_mut().draw(backend, camera, &model, &uniforms)?;
                stats.marker_draws += 1;
            }

            if index > 0 {
                backend.set_blend_state(BlendState::ALPHA);
                stats.blended_passes += 1;
            }

            for drawable in self
                .drawables
                .iter_mut()
                .filter(|d| d.light_index == index && d.is_camera_visible())
            {
                let uniforms = DrawUniforms::new(&light.light_space_matrix(&drawable.transform), &light.position(), alpha);
                let model = drawable.transform.to_matrix();
                if let Some(lit) = drawable.lit_mut() {
                    lit.draw(backend, camera, &model, &uniforms)?;
                    stats.lit_draws += 1;
                }
            }

            backend.set_blend_state(BlendState::Disabled);
            log::trace!("Light pass {} done", index);
        }

        self.frame_count += 1;
        log::debug!("Frame {} rendered: {:?}", self.frame_count, stats);
        Ok(stats)
    }

    /// Spin camera-visible objects whose instance count exceeds the threshold
    fn animate_drawables(&mut self, delta_time: f32) {
        let threshold = self.config.animation.instance_threshold;
        let step = utils::deg_to_rad(self.config.animation.rotation_deg_per_sec) * delta_time;

        for drawable in self
            .drawables
            .iter_mut()
            .filter(|d| d.is_camera_visible() && d.instance_count > threshold)
        {
            drawable.transform.rotate.y += step;
        }
    }

    /// Release every light's depth target
    ///
    /// Lights stay registered but can't be rendered until re-registered.
    pub fn shutdown(&mut self) -> RenderResult<()> {
        for entry in &mut self.lights {
            if let Some(target) = entry.light.shadow_target() {
                self.backend.destroy_render_target(target)?;
                entry.light.set_shadow_target(None);
            }
        }
        log::info!("Renderer shut down after {} frames", self.frame_count);
        Ok(())
    }

    /// Light by handle
    pub fn light(&self, id: LightId) -> Option<&ShadowLight> {
        self.lights.get(id.0).map(|entry| &entry.light)
    }

    /// Mutable light by handle
    pub fn light_mut(&mut self, id: LightId) -> Option<&mut ShadowLight> {
        self.lights.get_mut(id.0).map(|entry| &mut entry.light)
    }

    /// Marker attached to light `id`
    pub fn light_marker(&self, id: LightId) -> Option<&LightMarker> {
        self.lights.get(id.0).and_then(|entry| entry.marker.as_ref())
    }

    /// Lights in pass order
    pub fn lights(&self) -> impl Iterator<Item = &ShadowLight> {
        self.lights.iter().map(|entry| &entry.light)
    }

    /// Number of registered lights
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Drawable by handle
    pub fn drawable(&self, id: DrawableId) -> Option<&Drawable> {
        self.drawables.get(id.0)
    }

    /// Mutable drawable by handle
    pub fn drawable_mut(&mut self, id: DrawableId) -> Option<&mut Drawable> {
        self.drawables.get_mut(id.0)
    }

    /// Drawables in registration order
    pub fn drawables(&self) -> &[Drawable] {
        &self.drawables
    }

    /// Backend access
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable backend access
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Active configuration
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Frames rendered so far
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}
