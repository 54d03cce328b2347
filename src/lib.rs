/// Hybrid renderer - CPU scanline rasterizer and ray integrator that draw
/// into one shared framebuffer
pub mod camera;
pub mod error;
pub mod logging;
pub mod math;
pub mod perf;
pub mod rendering;
pub mod scene;

pub use camera::{Camera, Frustum, PerspectiveCamera};
pub use error::{RenderError, Result};
pub use math::{Aabb, PixelRect, Ray};
pub use perf::{CounterSnapshot, FunctionCounters, PerfStats, FUNCTION_COUNTERS};
pub use rendering::{
    Framebuffer, HybridRenderer, RayIntegrator, RenderConfig, RenderContext, RenderMode, Rasterizer,
    ShadingConfig, Texture,
};
pub use scene::{HitRecord, Mesh, Scene};
