/// Small geometric types shared by both pipelines
pub mod bounds;
pub mod ray;

pub use bounds::{Aabb, PixelRect};
pub use ray::{Ray, RAY_EPSILON};
