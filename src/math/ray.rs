//! Ray representation for scene queries.
//!
//! A ray is r(t) = origin + t * direction, valid on [t_min, t_max]. The
//! interval is mutable so that intersection routines can shrink `t_max` as
//! closer hits are found.

use glam::Vec3;

/// Default lower bound of the parametric interval. Keeps a ray from
/// re-hitting the surface it starts on.
pub const RAY_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    /// Always unit length.
    pub direction: Vec3,
    pub t_min: f32,
    pub t_max: f32,
}

impl Ray {
    /// Create a ray; `direction` is normalized here.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
            t_min: RAY_EPSILON,
            t_max: f32::MAX,
        }
    }

    /// Create a ray restricted to [t_min, t_max].
    pub fn with_interval(origin: Vec3, direction: Vec3, t_min: f32, t_max: f32) -> Self {
        Self {
            t_min,
            t_max,
            ..Self::new(origin, direction)
        }
    }

    /// Point at parameter t.
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// True if t lies strictly inside the current interval.
    #[inline]
    pub fn surrounds(&self, t: f32) -> bool {
        self.t_min < t && t < self.t_max
    }
}
