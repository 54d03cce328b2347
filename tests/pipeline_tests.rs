/// End-to-end tests of the render driver: both pipelines against the same
/// scene, the hybrid fill, and the failure paths of the render context.
use std::sync::Arc;

use glam::{Mat4, Vec3};
use hybrid_renderer::camera::PerspectiveCamera;
use hybrid_renderer::logging::init_logger;
use hybrid_renderer::rendering::{
    ConstantTexture, ContextState, Framebuffer, HybridRenderer, ImageTexture, RenderConfig,
    RenderContext, RenderMode, Texture, TraceConfig, FAR_DEPTH, MVP_UNIFORM,
};
use hybrid_renderer::scene::{Mesh, Scene};
use hybrid_renderer::RenderError;
use log::LevelFilter;

const SIZE: usize = 64;

fn camera() -> PerspectiveCamera {
    PerspectiveCamera::new((SIZE, SIZE), Vec3::ZERO, Vec3::Z, Vec3::Y, 60.0, 0.1, 100.0)
        .expect("valid camera")
}

/// Head-on quad whose edges stay clear of pixel centers
fn quad_scene() -> Scene {
    let mut scene = Scene::default();
    scene.add_mesh(Arc::new(
        Mesh::quad([
            Vec3::new(-1.05, -0.95, 6.0),
            Vec3::new(-1.05, 1.15, 6.0),
            Vec3::new(1.25, 1.15, 6.0),
            Vec3::new(1.25, -0.95, 6.0),
        ])
        .expect("valid quad"),
    ));
    scene.build_accel();
    scene
}

fn bound_context(texture: Arc<dyn Texture>) -> RenderContext {
    let cam = camera();
    let mvp = cam.view_projection_matrix();
    let mut ctx = RenderContext::new(Arc::new(cam)).expect("valid context");
    ctx.set_uniform(MVP_UNIFORM, mvp).unwrap();
    ctx.bind_texture(0, texture).unwrap();
    ctx
}

fn render(mode: RenderMode, scene: &Scene, texture: Arc<dyn Texture>) -> Framebuffer {
    init_logger(LevelFilter::Debug);
    let mut ctx = bound_context(texture);
    let renderer = HybridRenderer::new(RenderConfig {
        mode,
        ..RenderConfig::default()
    });
    renderer.render(scene, &mut ctx).expect("render succeeds");
    ctx.into_framebuffer().expect("finalized")
}

fn flat() -> Arc<dyn Texture> {
    Arc::new(ConstantTexture::new(Vec3::new(0.2, 0.6, 0.9)))
}

#[test]
fn ray_and_raster_agree_on_a_flat_quad() {
    let scene = quad_scene();
    let rasterized = render(RenderMode::Rasterize, &scene, flat());
    let traced = render(RenderMode::Trace, &scene, flat());

    assert_eq!(rasterized.color_buffer, traced.color_buffer);
    for (r, t) in rasterized.depth_buffer.iter().zip(&traced.depth_buffer) {
        assert_eq!(*r == FAR_DEPTH, *t == FAR_DEPTH, "coverage must match");
    }
    assert!(rasterized.uncovered_pixels() < SIZE * SIZE);
}

#[test]
fn ray_and_raster_agree_on_a_textured_quad() {
    // Bilinear 2x2 checkerboard: both pipelines reach the same uv per pixel,
    // so only 8-bit rounding can tell them apart.
    let checker: Arc<dyn Texture> = Arc::new(
        ImageTexture::checkerboard(2, 2, Vec3::X, Vec3::Z).expect("valid texture"),
    );
    let scene = quad_scene();
    let rasterized = render(RenderMode::Rasterize, &scene, checker.clone());
    let traced = render(RenderMode::Trace, &scene, checker);

    let differing = rasterized
        .color_buffer
        .iter()
        .zip(&traced.color_buffer)
        .filter(|(a, b)| a != b)
        .count();
    assert!(differing * 50 < SIZE * SIZE, "{differing} pixels differ");
}

#[test]
fn hybrid_fills_only_what_the_rasterizer_left() {
    init_logger(LevelFilter::Debug);
    let scene = quad_scene();
    let mut ctx = bound_context(flat());
    let renderer = HybridRenderer::new(RenderConfig::default());
    let stats = renderer.render(&scene, &mut ctx).expect("render succeeds");

    let raster = stats.raster.expect("raster pass ran");
    let trace = stats.trace.expect("trace pass ran");
    assert_eq!(raster.fragments_written + trace.pixels, SIZE * SIZE);
    assert_eq!(trace.hits, 0);

    let hybrid = ctx.into_framebuffer().expect("finalized");
    let rasterized = render(RenderMode::Rasterize, &scene, flat());
    assert_eq!(hybrid.color_buffer, rasterized.color_buffer);
}

#[test]
fn hybrid_traces_what_the_rasterizer_culls() {
    // Reverse winding: the rasterizer culls both triangles, the integrator
    // (two-sided) still sees the quad.
    let mut scene = Scene::default();
    scene.add_mesh(Arc::new(
        Mesh::quad([
            Vec3::new(1.25, -0.95, 6.0),
            Vec3::new(1.25, 1.15, 6.0),
            Vec3::new(-1.05, 1.15, 6.0),
            Vec3::new(-1.05, -0.95, 6.0),
        ])
        .expect("valid quad"),
    ));
    scene.build_accel();

    let hybrid = render(RenderMode::Hybrid, &scene, flat());
    let rasterized = render(RenderMode::Rasterize, &scene, flat());

    assert_eq!(rasterized.uncovered_pixels(), SIZE * SIZE);
    assert!(hybrid.uncovered_pixels() < SIZE * SIZE);
    let traced = render(RenderMode::Trace, &quad_scene(), flat());
    assert_eq!(hybrid.color_at(32, 32), traced.color_at(32, 32));
}

#[test]
fn empty_scene_completes_with_a_cleared_frame() {
    let scene = Scene::default();
    for mode in [RenderMode::Rasterize, RenderMode::Trace, RenderMode::Hybrid] {
        let fb = render(mode, &scene, flat());
        assert!(fb.color_buffer.iter().all(|&c| c == 0xFF000000), "{mode:?}");
        assert_eq!(fb.uncovered_pixels(), SIZE * SIZE);
    }
}

#[test]
fn zero_samples_per_pixel_skips_tracing() {
    init_logger(LevelFilter::Debug);
    let scene = quad_scene();
    let mut ctx = bound_context(flat());
    let renderer = HybridRenderer::new(RenderConfig {
        mode: RenderMode::Trace,
        trace: TraceConfig {
            samples_per_pixel: 0,
            ..TraceConfig::default()
        },
        clear_color: Some(0xFF336699),
        ..RenderConfig::default()
    });

    let stats = renderer.render(&scene, &mut ctx).expect("render succeeds");
    assert_eq!(stats.trace.expect("trace pass ran").pixels, 0);
    assert!(ctx.framebuffer().color_buffer.iter().all(|&c| c == 0xFF336699));
}

#[test]
fn supersampling_a_flat_quad_matches_one_sample_inside() {
    init_logger(LevelFilter::Debug);
    let scene = quad_scene();
    let mut ctx = bound_context(flat());
    let renderer = HybridRenderer::new(RenderConfig {
        mode: RenderMode::Trace,
        trace: TraceConfig {
            samples_per_pixel: 8,
            jitter: true,
            seed: 42,
        },
        ..RenderConfig::default()
    });
    let stats = renderer.render(&scene, &mut ctx).expect("render succeeds");
    assert_eq!(stats.trace.expect("trace pass ran").rays, SIZE * SIZE * 8);

    let single = render(RenderMode::Trace, &scene, flat());
    // Interior pixels are fully covered by every jittered sample
    assert_eq!(ctx.framebuffer().color_at(32, 32), single.color_at(32, 32));
    assert_eq!(ctx.framebuffer().color_at(0, 0), 0xFF000000);
}

#[test]
fn unbound_mvp_is_reported_before_any_pixel_is_written() {
    let mut ctx = RenderContext::new(Arc::new(camera())).expect("valid context");
    ctx.clear(0xFF336699).unwrap();
    ctx.bind_texture(0, flat()).unwrap();

    // Default config clears to black before drawing
    let renderer = HybridRenderer::new(RenderConfig::default());
    let err = renderer.render(&quad_scene(), &mut ctx).unwrap_err();

    assert_eq!(err, RenderError::UnboundUniform(MVP_UNIFORM.to_owned()));
    assert_ne!(ctx.state(), ContextState::Finalized);
    assert_eq!(ctx.framebuffer().uncovered_pixels(), SIZE * SIZE);
    assert!(ctx.framebuffer().color_buffer.iter().all(|&c| c == 0xFF336699));
}

#[test]
fn unbound_texture_is_reported() {
    let mut ctx = RenderContext::new(Arc::new(camera())).expect("valid context");
    ctx.set_uniform(MVP_UNIFORM, Mat4::IDENTITY).unwrap();

    let renderer = HybridRenderer::new(RenderConfig::default());
    let err = renderer.render(&quad_scene(), &mut ctx).unwrap_err();
    assert_eq!(err, RenderError::UnboundTexture(0));
}

#[test]
fn wrongly_typed_mvp_is_reported() {
    let mut ctx = RenderContext::new(Arc::new(camera())).expect("valid context");
    ctx.set_uniform(MVP_UNIFORM, Vec3::ONE).unwrap();
    ctx.bind_texture(0, flat()).unwrap();

    let renderer = HybridRenderer::new(RenderConfig::default());
    assert!(matches!(
        renderer.render(&quad_scene(), &mut ctx),
        Err(RenderError::UniformType { .. })
    ));
}
