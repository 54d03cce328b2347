/// Camera interface consumed by both pipelines, plus a perspective
/// camera and frustum used by the reference setup and tests
use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::error::{RenderError, Result};
use crate::math::Ray;

/// What the pipelines need from a camera.
///
/// `screen_map` and `generate_ray` must be inverses of each other for the
/// rasterizer and the ray integrator to sample the same surface point per pixel.
pub trait Camera: Send + Sync {
    /// (width, height) in pixels.
    fn resolution(&self) -> (usize, usize);

    /// Map a normalized-device coordinate to raster space (origin top-left).
    fn screen_map(&self, ndc: Vec3) -> Vec2;

    /// World-space ray through a raster-space point.
    fn generate_ray(&self, raster: Vec2) -> Ray;
}

/// Left-handed pinhole camera looking along +Z by default.
/// Depth maps to [0, 1], which is what the clip stage's `0 <= z <= w` test expects.
#[derive(Debug, Clone)]
pub struct PerspectiveCamera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    /// Vertical field of view (degrees)
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    width: usize,
    height: usize,
    view: Mat4,
    projection: Mat4,
    inv_view_projection: Mat4,
}

impl PerspectiveCamera {
    pub fn new(
        resolution: (usize, usize),
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        near: f32,
        far: f32,
    ) -> Result<Self> {
        let (width, height) = resolution;
        if width == 0 || height == 0 {
            return Err(RenderError::ZeroResolution { width, height });
        }

        let aspect_ratio = width as f32 / height as f32;
        let view = Mat4::look_at_lh(position, target, up);
        let projection = Mat4::perspective_lh(fov_y.to_radians(), aspect_ratio, near, far);
        let inv_view_projection = (projection * view).inverse();

        Ok(Self {
            position,
            target,
            up,
            fov_y,
            near,
            far,
            width,
            height,
            view,
            projection,
            inv_view_projection,
        })
    }

    /// Get view matrix
    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    /// Get projection matrix
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    /// Get combined view-projection matrix
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection * self.view
    }

    /// Frustum of this camera's view-projection.
    pub fn frustum(&self) -> Frustum {
        Frustum::from_view_projection(&self.view_projection_matrix())
    }
}

impl Camera for PerspectiveCamera {
    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn screen_map(&self, ndc: Vec3) -> Vec2 {
        Vec2::new(
            (ndc.x + 1.0) * 0.5 * self.width as f32,
            (1.0 - ndc.y) * 0.5 * self.height as f32, // Flip Y for screen coordinates
        )
    }

    fn generate_ray(&self, raster: Vec2) -> Ray {
        let ndc_x = 2.0 * raster.x / self.width as f32 - 1.0;
        let ndc_y = 1.0 - 2.0 * raster.y / self.height as f32;
        // Any point on the pixel's line of sight will do; the far plane is numerically stable.
        let far_point = self
            .inv_view_projection
            .project_point3(Vec3::new(ndc_x, ndc_y, 1.0));
        Ray::new(self.position, far_point - self.position)
    }
}

/// View frustum represented as 6 planes for AABB culling
/// Planes are stored in Hessian normal form: ax + by + cz + d = 0
/// where (a,b,c) is the inward-facing normal
#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    /// 6 planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a (model-)view-projection matrix
    /// using the Gribb-Hartmann method for a [0, 1] depth range.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let row0 = vp.row(0);
        let row1 = vp.row(1);
        let row2 = vp.row(2);
        let row3 = vp.row(3);

        Self {
            planes: [
                Self::normalize_plane(row3 + row0),
                Self::normalize_plane(row3 - row0),
                Self::normalize_plane(row3 + row1),
                Self::normalize_plane(row3 - row1),
                // z >= 0
                Self::normalize_plane(row2),
                // z <= w
                Self::normalize_plane(row3 - row2),
            ],
        }
    }

    #[inline]
    fn normalize_plane(plane: Vec4) -> Vec4 {
        let normal_length = plane.truncate().length();
        if normal_length > 0.0001 {
            plane / normal_length
        } else {
            plane
        }
    }

    /// Test if an AABB intersects the frustum
    /// Returns true if the box is at least partially inside
    pub fn intersects_aabb(&self, min: Vec3, max: Vec3) -> bool {
        for plane in &self.planes {
            // The corner furthest along the plane normal
            let p_vertex = Vec3::new(
                if plane.x > 0.0 { max.x } else { min.x },
                if plane.y > 0.0 { max.y } else { min.y },
                if plane.z > 0.0 { max.z } else { min.z },
            );

            if plane.truncate().dot(p_vertex) + plane.w < 0.0 {
                return false;
            }
        }

        true
    }
}
