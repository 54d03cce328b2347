/// Scene: an unordered set of meshes plus the acceleration structure
/// that answers ray queries against them
pub mod accel;
pub mod intersect;
pub mod mesh;

pub use accel::{Accelerator, NaiveAccel};
pub use mesh::{Mesh, Triangle};

use std::sync::Arc;

use glam::{Vec2, Vec3};

use crate::count_call;
use crate::math::Ray;

/// Result of a ray/scene query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Distance along the ray
    pub t: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Surface parameterization (interpolated texture coordinate)
    pub uv: Vec2,
    /// Barycentric weights (alpha, beta, gamma) of the hit inside its triangle
    pub barycentric: Vec3,
    /// Interpolated shading normal
    pub normal: Vec3,
    pub mesh_index: usize,
    pub triangle_index: usize,
}

impl HitRecord {
    /// Interpolate the triangle's attributes at barycentric (1 - b1 - b2, b1, b2).
    pub fn from_barycentric(
        tri: &Triangle<'_>,
        ray: &Ray,
        mesh_index: usize,
        triangle_index: usize,
        t: f32,
        b1: f32,
        b2: f32,
    ) -> Self {
        let b0 = 1.0 - b1 - b2;
        let [uv0, uv1, uv2] = tri.texcoords();
        let [n0, n1, n2] = tri.normals();
        Self {
            t,
            point: ray.at(t),
            uv: uv0 * b0 + uv1 * b1 + uv2 * b2,
            barycentric: Vec3::new(b0, b1, b2),
            normal: (n0 * b0 + n1 * b1 + n2 * b2).normalize_or_zero(),
            mesh_index,
            triangle_index,
        }
    }
}

pub struct Scene {
    meshes: Vec<Arc<Mesh>>,
    accel: Box<dyn Accelerator>,
    dirty: bool,
}

impl Scene {
    pub fn new(accel: Box<dyn Accelerator>) -> Self {
        Self {
            meshes: Vec::new(),
            accel,
            dirty: false,
        }
    }

    pub fn add_mesh(&mut self, mesh: Arc<Mesh>) {
        self.meshes.push(mesh);
        self.dirty = true;
    }

    /// Rebuild the acceleration structure after meshes were added.
    pub fn build_accel(&mut self) {
        self.accel.build(&self.meshes);
        self.dirty = false;
        log::debug!(
            "built acceleration structure over {} meshes ({} triangles)",
            self.meshes.len(),
            self.triangle_count()
        );
    }

    #[inline]
    pub fn meshes(&self) -> &[Arc<Mesh>] {
        &self.meshes
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// True if meshes were added since the last `build_accel`.
    #[inline]
    pub fn needs_rebuild(&self) -> bool {
        self.dirty
    }

    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|m| m.triangle_count()).sum()
    }

    /// Nearest surface hit within the ray's interval, tightening `ray.t_max`.
    pub fn intersect(&self, ray: &mut Ray) -> Option<HitRecord> {
        count_call!(crate::perf::FUNCTION_COUNTERS.rays_traced);
        self.accel.intersect(&self.meshes, ray)
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(Box::new(NaiveAccel::new()))
    }
}
