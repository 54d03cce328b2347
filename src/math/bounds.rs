/// Bounding volumes: world-space boxes for ray culling and
/// integer pixel rectangles for triangle setup
use glam::{IVec2, Vec3};

use super::ray::Ray;

/// Axis-aligned bounding box in world space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// An empty box; growing it by any point yields that point.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn from_points<'a, I: IntoIterator<Item = &'a Vec3>>(points: I) -> Self {
        points.into_iter().fold(Self::EMPTY, |mut b, p| {
            b.grow(*p);
            b
        })
    }

    #[inline]
    pub fn grow(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Slab test against the ray's current interval.
    pub fn hit(&self, ray: &Ray) -> bool {
        if self.is_empty() {
            return false;
        }
        let mut t0 = ray.t_min;
        let mut t1 = ray.t_max;
        for axis in 0..3 {
            let inv_d = 1.0 / ray.direction[axis];
            let mut near = (self.min[axis] - ray.origin[axis]) * inv_d;
            let mut far = (self.max[axis] - ray.origin[axis]) * inv_d;
            if inv_d < 0.0 {
                std::mem::swap(&mut near, &mut far);
            }
            // NaN (0 * inf) compares false and leaves the bound unchanged
            if near > t0 {
                t0 = near;
            }
            if far < t1 {
                t1 = far;
            }
            if t1 < t0 {
                return false;
            }
        }
        true
    }
}

/// Inclusive integer rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRect {
    pub min: IVec2,
    pub max: IVec2,
}

impl PixelRect {
    pub const EMPTY: PixelRect = PixelRect {
        min: IVec2::splat(i32::MAX),
        max: IVec2::splat(i32::MIN),
    };

    /// Rectangle covering a `width` x `height` screen.
    pub fn screen(width: usize, height: usize) -> Self {
        Self {
            min: IVec2::ZERO,
            max: IVec2::new(width as i32 - 1, height as i32 - 1),
        }
    }

    #[inline]
    pub fn expand(&mut self, p: IVec2) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    #[inline]
    pub fn clamp(&self, to: &PixelRect) -> PixelRect {
        PixelRect {
            min: self.min.max(to.min),
            max: self.max.min(to.max),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    #[inline]
    pub fn contains(&self, p: IVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}
