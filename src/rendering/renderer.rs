/// Frame driver composing the two pipelines over one render context
use std::time::Instant;

use super::context::{Bindings, RenderContext};
use super::framebuffer::Framebuffer;
use super::integrator::{trace_frame, Coverage, RayIntegrator, TraceConfig, TraceStats};
use super::rasterizer::{RasterConfig, RasterStats, Rasterizer};
use super::shading::{rgb_to_u32, Color, ShadingConfig};
use crate::error::Result;
use crate::math::Ray;
use crate::perf::PerfStats;
use crate::scene::Scene;

/// Something that can draw a scene's triangles into a framebuffer
pub trait Rasterize: Sync {
    fn rasterize(
        &self,
        scene: &Scene,
        bindings: &Bindings<'_>,
        framebuffer: &mut Framebuffer,
    ) -> RasterStats;
}

/// Radiance carried back along a camera ray.
///
/// Implementations query `scene.intersect`, which closes `ray.t_max` at the
/// hit distance; the integrator reads it back as the pixel's depth.
pub trait TraceRadiance: Sync {
    fn radiance(&self, ray: &mut Ray, scene: &Scene, bindings: &Bindings<'_>) -> Color;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    Rasterize,
    Trace,
    /// Rasterize, then trace only the pixels no triangle covered
    #[default]
    Hybrid,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    pub mode: RenderMode,
    pub raster: RasterConfig,
    pub trace: TraceConfig,
    pub shading: ShadingConfig,
    /// Cleared before rendering; `None` keeps the current contents
    pub clear_color: Option<u32>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            raster: RasterConfig::default(),
            trace: TraceConfig::default(),
            shading: ShadingConfig::default(),
            clear_color: Some(rgb_to_u32(0, 0, 0)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FrameStats {
    pub raster: Option<RasterStats>,
    pub trace: Option<TraceStats>,
    pub perf: PerfStats,
}

pub struct HybridRenderer<R: Rasterize = Rasterizer, T: TraceRadiance = RayIntegrator> {
    pub config: RenderConfig,
    pub rasterizer: R,
    pub tracer: T,
}

impl HybridRenderer {
    pub fn new(config: RenderConfig) -> Self {
        Self {
            rasterizer: Rasterizer::new(config.raster, config.shading),
            tracer: RayIntegrator::new(config.shading.filter),
            config,
        }
    }
}

impl Default for HybridRenderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl<R: Rasterize, T: TraceRadiance> HybridRenderer<R, T> {
    /// Plug in custom pipeline stages.
    pub fn with_stages(config: RenderConfig, rasterizer: R, tracer: T) -> Self {
        Self {
            config,
            rasterizer,
            tracer,
        }
    }

    /// Render one frame into the context and finalize it.
    ///
    /// Fails before touching any pixel if the context is missing the MVP
    /// uniform or the diffuse texture, or has already been finalized.
    pub fn render(&self, scene: &Scene, ctx: &mut RenderContext) -> Result<FrameStats> {
        let frame_start = Instant::now();
        let mut stats = FrameStats::default();

        if scene.needs_rebuild() {
            log::warn!("scene changed since the last build_accel; ray queries may be slow");
        }
        ctx.validate_bindings()?;
        if let Some(clear_color) = self.config.clear_color {
            ctx.clear(clear_color)?;
        }

        let target = ctx.begin_render()?;
        let bindings = target.bindings;
        let framebuffer = target.framebuffer;
        stats.perf.setup_us = frame_start.elapsed().as_secs_f64() * 1e6;

        if matches!(self.config.mode, RenderMode::Rasterize | RenderMode::Hybrid) {
            let start = Instant::now();
            stats.raster = Some(self.rasterizer.rasterize(scene, &bindings, framebuffer));
            stats.perf.rasterization_us = start.elapsed().as_secs_f64() * 1e6;
        }

        if matches!(self.config.mode, RenderMode::Trace | RenderMode::Hybrid) {
            let coverage = match self.config.mode {
                RenderMode::Hybrid => Coverage::Uncovered,
                _ => Coverage::All,
            };
            let start = Instant::now();
            stats.trace = Some(trace_frame(
                &self.tracer,
                &self.config.trace,
                &self.config.shading,
                scene,
                &bindings,
                coverage,
                framebuffer,
            ));
            stats.perf.tracing_us = start.elapsed().as_secs_f64() * 1e6;
        }

        ctx.finalize()?;
        stats.perf.total_us = frame_start.elapsed().as_secs_f64() * 1e6;

        log::info!(
            "{:?} frame: {} triangles drawn, {} pixels traced in {:.2}ms",
            self.config.mode,
            stats.raster.map_or(0, |r| r.triangles_drawn),
            stats.trace.map_or(0, |t| t.pixels),
            stats.perf.total_us / 1000.0
        );
        stats.perf.log_summary();
        #[cfg(feature = "profiling")]
        crate::perf::FUNCTION_COUNTERS.snapshot().log_report();

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::error::RenderError;
    use crate::rendering::context::{ContextState, MVP_UNIFORM};
    use crate::rendering::framebuffer::FAR_DEPTH;
    use crate::rendering::texture::ConstantTexture;
    use crate::scene::Mesh;
    use glam::{Mat4, Vec3};
    use std::sync::Arc;

    fn setup(mode: RenderMode) -> (HybridRenderer, Scene, RenderContext) {
        let camera =
            PerspectiveCamera::new((32, 32), Vec3::ZERO, Vec3::Z, Vec3::Y, 60.0, 0.1, 100.0)
                .expect("valid camera");
        let mvp = camera.view_projection_matrix();

        let mut scene = Scene::default();
        // Quad in the middle of the view, clockwise on screen.
        // Its edges stay clear of pixel centers so coverage is unambiguous.
        scene.add_mesh(Arc::new(
            Mesh::quad([
                Vec3::new(-1.1, -0.9, 5.0),
                Vec3::new(-1.1, 1.2, 5.0),
                Vec3::new(1.3, 1.2, 5.0),
                Vec3::new(1.3, -0.9, 5.0),
            ])
            .expect("valid quad"),
        ));
        scene.build_accel();

        let mut ctx = RenderContext::new(Arc::new(camera)).expect("valid context");
        ctx.set_uniform(MVP_UNIFORM, mvp).unwrap();
        ctx.bind_texture(0, Arc::new(ConstantTexture::new(Vec3::X))).unwrap();

        let renderer = HybridRenderer::new(RenderConfig {
            mode,
            ..RenderConfig::default()
        });
        (renderer, scene, ctx)
    }

    #[test]
    fn rasterize_mode_leaves_background_uncovered() {
        let (renderer, scene, mut ctx) = setup(RenderMode::Rasterize);
        let stats = renderer.render(&scene, &mut ctx).unwrap();

        let raster = stats.raster.expect("raster pass ran");
        assert_eq!(raster.triangles_drawn, 2);
        assert!(stats.trace.is_none());
        assert_eq!(ctx.state(), ContextState::Finalized);

        let fb = ctx.framebuffer();
        assert_eq!(fb.color_at(16, 16), 0xFFFF0000);
        assert_eq!(fb.depth_at(0, 0), FAR_DEPTH);
    }

    #[test]
    fn hybrid_mode_traces_only_the_gaps() {
        let (renderer, scene, mut ctx) = setup(RenderMode::Hybrid);
        let stats = renderer.render(&scene, &mut ctx).unwrap();

        let raster = stats.raster.expect("raster pass ran");
        let trace = stats.trace.expect("trace pass ran");
        assert_eq!(raster.fragments_written + trace.pixels, 32 * 32);
        // Every ray misses: the quad is fully covered by the rasterizer
        assert_eq!(trace.hits, 0);
        assert_eq!(ctx.framebuffer().color_at(16, 16), 0xFFFF0000);
    }

    #[test]
    fn trace_mode_matches_raster_on_the_quad_center() {
        let (renderer, scene, mut ctx) = setup(RenderMode::Trace);
        let stats = renderer.render(&scene, &mut ctx).unwrap();

        assert!(stats.raster.is_none());
        assert_eq!(stats.trace.expect("trace pass ran").pixels, 32 * 32);
        assert_eq!(ctx.framebuffer().color_at(16, 16), 0xFFFF0000);
        assert_eq!(ctx.framebuffer().color_at(0, 0), 0xFF000000);
    }

    #[test]
    fn missing_mvp_fails_before_drawing() {
        let camera = PerspectiveCamera::new((8, 8), Vec3::ZERO, Vec3::Z, Vec3::Y, 60.0, 0.1, 100.0)
            .expect("valid camera");
        let mut ctx = RenderContext::new(Arc::new(camera)).expect("valid context");
        ctx.bind_texture(0, Arc::new(ConstantTexture::new(Vec3::X))).unwrap();

        let renderer: HybridRenderer = HybridRenderer::default();
        let err = renderer.render(&Scene::default(), &mut ctx).unwrap_err();
        assert_eq!(err, RenderError::UnboundUniform(MVP_UNIFORM.to_owned()));
        assert_eq!(ctx.framebuffer().uncovered_pixels(), 64);
    }

    #[test]
    fn unbound_texture_leaves_the_previous_image() {
        let camera = PerspectiveCamera::new((8, 8), Vec3::ZERO, Vec3::Z, Vec3::Y, 60.0, 0.1, 100.0)
            .expect("valid camera");
        let mut ctx = RenderContext::new(Arc::new(camera)).expect("valid context");
        ctx.clear(0xFF123456).unwrap();
        ctx.set_uniform(MVP_UNIFORM, Mat4::IDENTITY).unwrap();

        // Default config clears to black; the error must come first
        let renderer: HybridRenderer = HybridRenderer::default();
        let err = renderer.render(&Scene::default(), &mut ctx).unwrap_err();
        assert_eq!(err, RenderError::UnboundTexture(0));
        assert!(ctx.framebuffer().color_buffer.iter().all(|&c| c == 0xFF123456));
    }

    #[test]
    fn finalized_context_is_not_rendered_twice() {
        let (renderer, scene, mut ctx) = setup(RenderMode::Rasterize);
        renderer.render(&scene, &mut ctx).unwrap();
        assert!(matches!(
            renderer.render(&scene, &mut ctx),
            Err(RenderError::InvalidState { .. })
        ));
    }
}
