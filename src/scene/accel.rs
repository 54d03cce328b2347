/// Acceleration structures answering "nearest hit along this ray".
use std::sync::Arc;

use super::intersect::intersect_triangle;
use super::mesh::Mesh;
use super::HitRecord;
use crate::count_call;
use crate::math::{Aabb, Ray};

/// Ray query over a set of meshes. Implementations must be shareable
/// across the integrator's worker threads.
pub trait Accelerator: Send + Sync {
    /// Rebuild internal state for `meshes`. Called whenever the scene changes.
    fn build(&mut self, meshes: &[Arc<Mesh>]);

    /// Nearest hit inside the ray's interval. On a hit, `ray.t_max` is
    /// tightened to the hit distance.
    fn intersect(&self, meshes: &[Arc<Mesh>], ray: &mut Ray) -> Option<HitRecord>;
}

/// Linear scan over all triangles, with a per-mesh bounding box early-out.
#[derive(Debug, Default, Clone)]
pub struct NaiveAccel {
    bounds: Vec<Aabb>,
}

impl NaiveAccel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Accelerator for NaiveAccel {
    fn build(&mut self, meshes: &[Arc<Mesh>]) {
        self.bounds = meshes.iter().map(|m| m.bounds()).collect();
    }

    fn intersect(&self, meshes: &[Arc<Mesh>], ray: &mut Ray) -> Option<HitRecord> {
        let mut closest: Option<(usize, usize, f32, f32, f32)> = None;

        for (mesh_index, mesh) in meshes.iter().enumerate() {
            // Meshes added after the last build are tested without culling
            if let Some(bounds) = self.bounds.get(mesh_index) {
                if !bounds.hit(ray) {
                    continue;
                }
            }

            for (triangle_index, tri) in mesh.triangles().enumerate() {
                count_call!(crate::perf::FUNCTION_COUNTERS.triangle_tests);
                let [p0, p1, p2] = tri.positions();
                if let Some((t, b1, b2)) = intersect_triangle(ray, p0, p1, p2) {
                    ray.t_max = t;
                    closest = Some((mesh_index, triangle_index, t, b1, b2));
                }
            }
        }

        let (mesh_index, triangle_index, t, b1, b2) = closest?;
        let tri = meshes[mesh_index].triangle(triangle_index);
        Some(HitRecord::from_barycentric(
            &tri,
            ray,
            mesh_index,
            triangle_index,
            t,
            b1,
            b2,
        ))
    }
}
