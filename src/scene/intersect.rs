/// Ray/triangle intersection (Möller–Trumbore), two-sided
use glam::Vec3;

use crate::math::Ray;

const DET_EPSILON: f32 = 1e-8;

/// Returns (t, b1, b2) where b1/b2 are the barycentric weights of vertices 1 and 2,
/// if the ray hits the triangle strictly inside its current interval.
#[inline]
pub fn intersect_triangle(ray: &Ray, p0: Vec3, p1: Vec3, p2: Vec3) -> Option<(f32, f32, f32)> {
    let e1 = p1 - p0;
    let e2 = p2 - p0;
    let pvec = ray.direction.cross(e2);
    let det = e1.dot(pvec);
    if det.abs() < DET_EPSILON {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = ray.origin - p0;
    let b1 = tvec.dot(pvec) * inv_det;
    if !(0.0..=1.0).contains(&b1) {
        return None;
    }

    let qvec = tvec.cross(e1);
    let b2 = ray.direction.dot(qvec) * inv_det;
    if b2 < 0.0 || b1 + b2 > 1.0 {
        return None;
    }

    let t = e2.dot(qvec) * inv_det;
    if !ray.surrounds(t) {
        return None;
    }
    Some((t, b1, b2))
}
