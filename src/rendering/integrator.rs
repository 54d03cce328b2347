/// Ray integrator: per-pixel camera rays, scene queries and sample averaging.
///
/// Stripes of rows are traced in parallel. Every visited pixel gets color
/// and depth written together: depth is `1 / t` for a hit and `FAR_DEPTH`
/// for a miss. `1 / t` is not comparable with the rasterizer's `1 / w`, so
/// in hybrid mode the two passes only ever write disjoint pixels.
use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use super::context::Bindings;
use super::framebuffer::{FrameSlice, Framebuffer, FAR_DEPTH};
use super::renderer::TraceRadiance;
use super::shading::{Color, ShadingConfig};
use super::texture::TextureFilter;
use crate::math::Ray;
use crate::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceConfig {
    pub samples_per_pixel: u32,
    /// Jitter samples inside the pixel instead of using its center
    pub jitter: bool,
    /// Base seed for the per-pixel jitter sequence
    pub seed: u64,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: 1,
            jitter: false,
            seed: 0,
        }
    }
}

/// Which pixels a trace pass visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coverage {
    All,
    /// Only pixels still at `FAR_DEPTH`
    Uncovered,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TraceStats {
    pub pixels: usize,
    pub rays: usize,
    pub hits: usize,
}

impl TraceStats {
    fn merge(mut self, other: TraceStats) -> TraceStats {
        self.pixels += other.pixels;
        self.rays += other.rays;
        self.hits += other.hits;
        self
    }
}

/// Unlit diffuse radiance: the bound texture sampled at the hit's uv
#[derive(Debug, Clone, Copy, Default)]
pub struct RayIntegrator {
    pub filter: TextureFilter,
}

impl RayIntegrator {
    pub fn new(filter: TextureFilter) -> Self {
        Self { filter }
    }
}

impl TraceRadiance for RayIntegrator {
    fn radiance(&self, ray: &mut Ray, scene: &Scene, bindings: &Bindings<'_>) -> Color {
        match scene.intersect(ray) {
            Some(hit) => bindings.diffuse.sample(hit.uv.x, hit.uv.y, self.filter),
            None => Color::ZERO,
        }
    }
}

/// Deterministic per-pixel generator so results do not depend on scheduling.
#[inline]
fn pixel_rng(seed: u64, pixel_index: usize) -> StdRng {
    StdRng::seed_from_u64(seed ^ (pixel_index as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
}

/// Trace one stripe of rows.
fn trace_slice<T: TraceRadiance + ?Sized>(
    tracer: &T,
    config: &TraceConfig,
    shading: &ShadingConfig,
    scene: &Scene,
    bindings: &Bindings<'_>,
    coverage: Coverage,
    slice: &mut FrameSlice<'_>,
) -> TraceStats {
    let mut stats = TraceStats::default();
    let inv_samples = 1.0 / config.samples_per_pixel as f32;

    for y in slice.rows() {
        for x in 0..slice.width {
            let Some(index) = slice.local_index(x, y) else {
                continue;
            };
            if coverage == Coverage::Uncovered && slice.depth_at(index) != FAR_DEPTH {
                continue;
            }

            let mut rng = config
                .jitter
                .then(|| pixel_rng(config.seed, y * slice.width + x));
            let mut radiance = Color::ZERO;
            let mut nearest = f32::INFINITY;

            for _ in 0..config.samples_per_pixel {
                let offset = match rng.as_mut() {
                    Some(rng) => Vec2::new(rng.gen::<f32>(), rng.gen::<f32>()),
                    None => Vec2::splat(0.5),
                };
                let mut ray = bindings
                    .camera
                    .generate_ray(Vec2::new(x as f32, y as f32) + offset);
                stats.rays += 1;

                radiance += tracer.radiance(&mut ray, scene, bindings);
                // A hit leaves the ray's interval closed at the hit distance
                if ray.t_max < f32::MAX {
                    nearest = nearest.min(ray.t_max);
                    stats.hits += 1;
                }
            }

            let depth = if nearest.is_finite() && nearest > 0.0 {
                1.0 / nearest
            } else {
                FAR_DEPTH
            };
            slice.write(index, shading.resolve(radiance * inv_samples), depth);
            stats.pixels += 1;
        }
    }

    stats
}

/// Trace every pixel selected by `coverage`, in parallel row stripes.
pub fn trace_frame<T: TraceRadiance + ?Sized>(
    tracer: &T,
    config: &TraceConfig,
    shading: &ShadingConfig,
    scene: &Scene,
    bindings: &Bindings<'_>,
    coverage: Coverage,
    framebuffer: &mut Framebuffer,
) -> TraceStats {
    if config.samples_per_pixel == 0 {
        log::warn!("samples_per_pixel is 0, skipping trace pass");
        return TraceStats::default();
    }

    crate::perf_scope!("trace_frame");
    let stripes = (rayon::current_num_threads() * 4).max(1);
    let stats = framebuffer
        .split_into_stripes(stripes)
        .into_par_iter()
        .map(|mut slice| {
            trace_slice(tracer, config, shading, scene, bindings, coverage, &mut slice)
        })
        .reduce(TraceStats::default, TraceStats::merge);

    log::debug!(
        "integrator: {} pixels, {} rays, {} hits",
        stats.pixels,
        stats.rays,
        stats.hits
    );
    stats
}
