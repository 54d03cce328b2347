/// Software rasterizer: triangle setup and the per-pixel barycentric loop.
///
/// Depth is reciprocal w (rhw), so a fragment is visible when its
/// interpolated rhw is *greater* than the stored value.
use glam::{Vec2, Vec3};
use rayon::prelude::*;

use super::context::Bindings;
use super::framebuffer::Framebuffer;
use super::renderer::Rasterize;
use super::shading::ShadingConfig;
use super::texture::Texture;
use super::tiles::{render_tiles, DEFAULT_TILE_SIZE};
use super::vertex::{project_triangle, ProjectedTriangle};
use crate::camera::Frustum;
use crate::math::PixelRect;
use crate::scene::Scene;
use crate::{count_add, count_call};

/// Slack on the `beta + gamma <= 1` edge so shared edges leave no cracks
pub const EDGE_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterConfig {
    pub backface_culling: bool,
    /// Skip meshes whose bounds lie outside the MVP frustum
    pub frustum_culling: bool,
    /// Side of the square screen tiles used for parallel rasterization
    pub tile_size: usize,
}

impl Default for RasterConfig {
    fn default() -> Self {
        Self {
            backface_culling: true,
            frustum_culling: true,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }
}

/// Counts for one rasterization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterStats {
    pub meshes_culled: usize,
    pub triangles_submitted: usize,
    pub triangles_clipped: usize,
    pub triangles_backfacing: usize,
    pub triangles_degenerate: usize,
    pub triangles_drawn: usize,
    pub fragments_tested: usize,
    pub fragments_written: usize,
}

impl RasterStats {
    pub fn merge(&mut self, other: &RasterStats) {
        self.meshes_culled += other.meshes_culled;
        self.triangles_submitted += other.triangles_submitted;
        self.triangles_clipped += other.triangles_clipped;
        self.triangles_backfacing += other.triangles_backfacing;
        self.triangles_degenerate += other.triangles_degenerate;
        self.triangles_drawn += other.triangles_drawn;
        self.fragments_tested += other.fragments_tested;
        self.fragments_written += other.fragments_written;
    }
}

/// Outcome of triangle setup
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TriangleSetup {
    Visible(ProjectedTriangle),
    /// A vertex left the view volume (or had w == 0)
    Clipped,
    Backfacing,
    Degenerate,
}

/// Abstraction over a render target that supports depth-tested pixel writes.
pub trait PixelTarget {
    /// Pixels this target covers, in framebuffer coordinates.
    fn rect(&self) -> PixelRect;
    /// Depth test against `rhw`; on success the depth is already written
    /// and the buffer index for the color is returned.
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, rhw: f32) -> Option<usize>;
    fn write_color(&mut self, index: usize, color: u32);
}

impl PixelTarget for Framebuffer {
    #[inline]
    fn rect(&self) -> PixelRect {
        self.screen_rect()
    }

    #[inline]
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, rhw: f32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = self.index(x, y);
        if rhw > self.depth_buffer[index] {
            self.depth_buffer[index] = rhw;
            Some(index)
        } else {
            None
        }
    }

    #[inline]
    fn write_color(&mut self, index: usize, color: u32) {
        self.color_buffer[index] = color;
    }
}

/// Barycentric weights (alpha, beta, gamma) of `p` in triangle (a, b, c).
/// `None` for a zero-area triangle.
#[inline]
pub fn barycentric(a: Vec2, b: Vec2, c: Vec2, p: Vec2) -> Option<Vec3> {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let denom = ab.perp_dot(ac);
    if denom == 0.0 {
        return None;
    }
    let inv = 1.0 / denom;
    let beta = ap.perp_dot(ac) * inv;
    let gamma = ab.perp_dot(ap) * inv;
    Some(Vec3::new(1.0 - beta - gamma, beta, gamma))
}

/// Containment test on the barycentric weights; alpha is implied by
/// `beta + gamma <= 1`.
#[inline]
pub fn covers(weights: Vec3) -> bool {
    weights.y >= 0.0 && weights.z >= 0.0 && weights.y + weights.z <= 1.0 + EDGE_EPSILON
}

/// Screen-space weights turned into perspective-correct ones.
#[inline]
pub fn perspective_correct(weights: Vec3, rhw: Vec3) -> Vec3 {
    let interpolated = weights.dot(rhw);
    let w = 1.0 / if interpolated == 0.0 { 1.0 } else { interpolated };
    weights * rhw * w
}

/// Fragment counts for a single triangle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub tested: usize,
    pub written: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Rasterizer {
    pub config: RasterConfig,
    pub shading: ShadingConfig,
}

impl Rasterizer {
    pub fn new(config: RasterConfig, shading: ShadingConfig) -> Self {
        Self { config, shading }
    }

    /// Vertex stage plus culling for one triangle of a scene mesh.
    pub fn setup(
        &self,
        scene: &Scene,
        mesh_index: usize,
        triangle_index: usize,
        bindings: &Bindings<'_>,
    ) -> TriangleSetup {
        let Some(mesh) = scene.meshes().get(mesh_index) else {
            return TriangleSetup::Degenerate;
        };
        let tri = mesh.triangle(triangle_index);
        let Some(projected) = project_triangle(
            &tri,
            mesh_index,
            triangle_index,
            &bindings.uniforms.mvp,
            bindings.camera,
        ) else {
            count_call!(crate::perf::FUNCTION_COUNTERS.triangles_clip_rejected);
            return TriangleSetup::Clipped;
        };
        self.cull(projected)
    }

    /// Backface and degenerate tests on an already projected triangle.
    pub fn cull(&self, projected: ProjectedTriangle) -> TriangleSetup {
        if self.config.backface_culling && projected.facing() >= 0.0 {
            count_call!(crate::perf::FUNCTION_COUNTERS.triangles_culled);
            return TriangleSetup::Backfacing;
        }
        if projected.screen_area() == 0.0 {
            return TriangleSetup::Degenerate;
        }
        TriangleSetup::Visible(projected)
    }

    /// Scan the triangle's bounds (clamped to the target) and shade every
    /// covered pixel that passes the depth test.
    pub fn draw_triangle<T: PixelTarget>(
        &self,
        tri: &ProjectedTriangle,
        texture: &dyn Texture,
        target: &mut T,
    ) -> DrawStats {
        let mut stats = DrawStats::default();

        let rect = tri.bounds.clamp(&target.rect());
        if rect.is_empty() {
            return stats;
        }

        let [v0, v1, v2] = &tri.vertices;
        let rhw = Vec3::new(v0.rhw, v1.rhw, v2.rhw);

        for y in rect.min.y..=rect.max.y {
            for x in rect.min.x..=rect.max.x {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let Some(weights) = barycentric(v0.screen, v1.screen, v2.screen, center) else {
                    return stats;
                };
                if !covers(weights) {
                    continue;
                }

                stats.tested += 1;
                count_call!(crate::perf::FUNCTION_COUNTERS.fragments_tested);

                let depth = weights.dot(rhw);
                let Some(index) = target.test_depth_and_get_index(x as usize, y as usize, depth)
                else {
                    count_call!(crate::perf::FUNCTION_COUNTERS.depth_failed);
                    continue;
                };
                count_call!(crate::perf::FUNCTION_COUNTERS.depth_passed);

                let corrected = perspective_correct(weights, rhw);
                let uv = v0.texcoord * corrected.x
                    + v1.texcoord * corrected.y
                    + v2.texcoord * corrected.z;
                let color = texture.sample(uv.x, uv.y, self.shading.filter);
                target.write_color(index, self.shading.resolve(color));
                stats.written += 1;
            }
        }

        stats
    }

    /// Transform, clip and cull every triangle in the scene in parallel.
    /// Visible triangles come back in submission order.
    pub fn project_scene(
        &self,
        scene: &Scene,
        bindings: &Bindings<'_>,
    ) -> (Vec<ProjectedTriangle>, RasterStats) {
        crate::perf_scope!("project_scene");
        let mut stats = RasterStats::default();
        let mut visible = Vec::new();
        let frustum = Frustum::from_view_projection(&bindings.uniforms.mvp);

        for (mesh_index, mesh) in scene.meshes().iter().enumerate() {
            if mesh.is_empty() {
                continue;
            }
            let bounds = mesh.bounds();
            if self.config.frustum_culling && !frustum.intersects_aabb(bounds.min, bounds.max) {
                count_add!(
                    crate::perf::FUNCTION_COUNTERS.triangles_clip_rejected,
                    mesh.triangle_count() as u64
                );
                stats.meshes_culled += 1;
                stats.triangles_submitted += mesh.triangle_count();
                stats.triangles_clipped += mesh.triangle_count();
                continue;
            }

            let setups: Vec<TriangleSetup> = (0..mesh.triangle_count())
                .into_par_iter()
                .map(|triangle_index| self.setup(scene, mesh_index, triangle_index, bindings))
                .collect();

            stats.triangles_submitted += setups.len();
            for setup in setups {
                match setup {
                    TriangleSetup::Visible(tri) => visible.push(tri),
                    TriangleSetup::Clipped => stats.triangles_clipped += 1,
                    TriangleSetup::Backfacing => stats.triangles_backfacing += 1,
                    TriangleSetup::Degenerate => stats.triangles_degenerate += 1,
                }
            }
        }

        stats.triangles_drawn = visible.len();
        (visible, stats)
    }
}

impl Rasterize for Rasterizer {
    fn rasterize(
        &self,
        scene: &Scene,
        bindings: &Bindings<'_>,
        framebuffer: &mut Framebuffer,
    ) -> RasterStats {
        let (triangles, mut stats) = self.project_scene(scene, bindings);
        if triangles.is_empty() {
            log::debug!(
                "rasterizer: nothing visible ({} triangles submitted)",
                stats.triangles_submitted
            );
            return stats;
        }

        let draw = render_tiles(self, &triangles, bindings.diffuse, framebuffer);
        stats.fragments_tested = draw.tested;
        stats.fragments_written = draw.written;

        log::debug!(
            "rasterizer: {} drawn, {} clipped, {} backfacing, {} fragments written",
            stats.triangles_drawn,
            stats.triangles_clipped,
            stats.triangles_backfacing,
            stats.fragments_written
        );
        stats
    }
}
