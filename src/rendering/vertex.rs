/// Vertex stage: homogeneous transform, accept/reject clip test,
/// perspective divide and screen mapping.
///
/// Clipping is accept/reject only. A triangle with any vertex outside the
/// view volume is dropped whole, so geometry straddling a frustum plane
/// disappears rather than being cut.
use glam::{IVec2, Mat4, Vec2, Vec3, Vec4};

use crate::camera::Camera;
use crate::count_call;
use crate::math::PixelRect;
use crate::scene::Triangle;

/// A vertex after the perspective divide, ready for setup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterVertex {
    /// Clip position scaled by `rhw` (NDC in xyz, w == 1)
    pub position: Vec4,
    pub texcoord: Vec2,
    pub normal: Vec3,
    /// Raster-space position (origin top-left)
    pub screen: Vec2,
    /// Pixel the vertex falls in
    pub pixel: IVec2,
    /// Reciprocal of clip-space w
    pub rhw: f32,
}

/// Three transformed vertices plus their unclamped pixel bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedTriangle {
    pub vertices: [RasterVertex; 3],
    pub bounds: PixelRect,
    pub mesh_index: usize,
    pub triangle_index: usize,
}

impl ProjectedTriangle {
    /// z of cross(v1 - v0, v2 - v0) over post-divide positions.
    /// Front faces are strictly negative.
    #[inline]
    pub fn facing(&self) -> f32 {
        let [v0, v1, v2] = &self.vertices;
        let e1 = (v1.position - v0.position).truncate();
        let e2 = (v2.position - v0.position).truncate();
        e1.cross(e2).z
    }

    /// Twice the signed raster-space area. Zero for degenerate triangles.
    #[inline]
    pub fn screen_area(&self) -> f32 {
        let [v0, v1, v2] = &self.vertices;
        (v1.screen - v0.screen).perp_dot(v2.screen - v0.screen)
    }
}

/// True if a clip-space point lies inside the canonical view volume
/// (`0 <= z <= w`, `|x| <= w`, `|y| <= w`).
#[inline]
pub fn inside_view_volume(clip: Vec4) -> bool {
    clip.z >= 0.0 && clip.z <= clip.w && clip.x.abs() <= clip.w && clip.y.abs() <= clip.w
}

/// Transform one vertex. `None` rejects the whole triangle.
#[inline]
pub fn transform_vertex(
    mvp: &Mat4,
    camera: &dyn Camera,
    position: Vec3,
    texcoord: Vec2,
    normal: Vec3,
) -> Option<RasterVertex> {
    count_call!(crate::perf::FUNCTION_COUNTERS.vertex_transforms);

    let clip = *mvp * position.extend(1.0);
    if clip.w == 0.0 || !inside_view_volume(clip) {
        return None;
    }

    let rhw = 1.0 / clip.w;
    let ndc = clip * rhw;
    let screen = camera.screen_map(ndc.truncate());
    let pixel = IVec2::new((screen.x + 0.5) as i32, (screen.y + 0.5) as i32);

    Some(RasterVertex {
        position: ndc,
        texcoord,
        normal,
        screen,
        pixel,
        rhw,
    })
}

/// Run the vertex stage over a triangle, expanding its pixel bounds.
pub fn project_triangle(
    tri: &Triangle<'_>,
    mesh_index: usize,
    triangle_index: usize,
    mvp: &Mat4,
    camera: &dyn Camera,
) -> Option<ProjectedTriangle> {
    let positions = tri.positions();
    let texcoords = tri.texcoords();
    let normals = tri.normals();

    let mut bounds = PixelRect::EMPTY;
    let mut vertices = [None; 3];
    for i in 0..3 {
        let v = transform_vertex(mvp, camera, positions[i], texcoords[i], normals[i])?;
        bounds.expand(v.pixel);
        vertices[i] = Some(v);
    }

    let [Some(v0), Some(v1), Some(v2)] = vertices else {
        return None;
    };

    Some(ProjectedTriangle {
        vertices: [v0, v1, v2],
        bounds,
        mesh_index,
        triangle_index,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::scene::Mesh;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new((300, 300), Vec3::ZERO, Vec3::Z, Vec3::Y, 60.0, 0.1, 100.0)
            .expect("valid camera")
    }

    fn mesh(points: [Vec3; 3]) -> Mesh {
        Mesh::new(
            points.to_vec(),
            vec![Vec2::ZERO, Vec2::X, Vec2::Y],
            vec![Vec3::NEG_Z; 3],
            vec![0, 1, 2],
        )
        .expect("valid mesh")
    }

    #[test]
    fn zero_w_rejects_vertex() {
        let mvp = Mat4::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::ZERO);
        assert!(transform_vertex(&mvp, &camera(), Vec3::ZERO, Vec2::ZERO, Vec3::Z).is_none());
    }

    #[test]
    fn every_clip_plane_rejects() {
        let cam = camera();
        let id = Mat4::IDENTITY;
        for p in [
            Vec3::new(1.5, 0.0, 0.5),
            Vec3::new(-1.5, 0.0, 0.5),
            Vec3::new(0.0, 1.5, 0.5),
            Vec3::new(0.0, -1.5, 0.5),
            Vec3::new(0.0, 0.0, -0.1),
            Vec3::new(0.0, 0.0, 1.1),
        ] {
            assert!(
                transform_vertex(&id, &cam, p, Vec2::ZERO, Vec3::Z).is_none(),
                "{p:?} should be outside"
            );
        }
        let corner = Vec3::new(1.0, -1.0, 1.0);
        assert!(transform_vertex(&id, &cam, corner, Vec2::ZERO, Vec3::Z).is_some());
    }

    #[test]
    fn negative_w_is_outside() {
        assert!(!inside_view_volume(Vec4::new(0.0, 0.0, -0.5, -1.0)));
    }

    #[test]
    fn pixel_position_rounds_half_up() {
        let cam = camera();
        // NDC (0, 0) maps to raster (150, 150)
        let center = Vec3::new(0.0, 0.0, 0.5);
        let v = transform_vertex(&Mat4::IDENTITY, &cam, center, Vec2::ZERO, Vec3::Z)
            .expect("inside");
        assert_eq!(v.screen, Vec2::new(150.0, 150.0));
        assert_eq!(v.pixel, IVec2::new(150, 150));
        assert_eq!(v.rhw, 1.0);

        // Raster x = 0.6 rounds to pixel 1
        let ndc_x = 0.6 / 150.0 - 1.0;
        let top_left = Vec3::new(ndc_x, 1.0, 0.5);
        let v = transform_vertex(&Mat4::IDENTITY, &cam, top_left, Vec2::ZERO, Vec3::Z)
            .expect("inside");
        assert_eq!(v.pixel, IVec2::new(1, 0));
    }

    #[test]
    fn perspective_divide_scales_by_rhw() {
        let cam = camera();
        let mvp = Mat4::from_cols(Vec4::X, Vec4::Y, Vec4::Z, Vec4::new(0.0, 0.0, 0.0, 2.0));
        let v = transform_vertex(&mvp, &cam, Vec3::new(1.0, 1.0, 1.0), Vec2::ZERO, Vec3::Z)
            .expect("inside");
        assert_eq!(v.rhw, 0.5);
        assert_eq!(v.position, Vec4::new(0.5, 0.5, 0.5, 1.0));
    }

    #[test]
    fn triangle_bounds_cover_all_vertices() {
        let cam = camera();
        let m = mesh([
            Vec3::new(-1.0 / 3.0, 1.0 / 3.0, 0.5),
            Vec3::new(1.0 / 3.0, 1.0 / 3.0, 0.5),
            Vec3::new(0.0, -1.0 / 3.0, 0.5),
        ]);
        let tri = project_triangle(&m.triangle(0), 0, 0, &Mat4::IDENTITY, &cam).expect("visible");
        assert_eq!(tri.bounds.min, IVec2::new(100, 100));
        assert_eq!(tri.bounds.max, IVec2::new(200, 200));
        assert!(tri.facing() < 0.0, "clockwise on screen is front facing");
        assert!(tri.screen_area() > 0.0);
    }

    #[test]
    fn one_vertex_outside_rejects_triangle() {
        let cam = camera();
        let m = mesh([
            Vec3::new(0.0, 0.0, 0.5),
            Vec3::new(0.5, 0.0, 0.5),
            Vec3::new(0.0, 2.0, 0.5),
        ]);
        assert!(project_triangle(&m.triangle(0), 0, 0, &Mat4::IDENTITY, &cam).is_none());
    }
}
