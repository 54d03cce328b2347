/// Rendering: the shared framebuffer, bound state, and the two pipelines
/// (scanline rasterizer and ray integrator) that write into it
pub mod context;
pub mod framebuffer;
pub mod integrator;
pub mod rasterizer;
pub mod renderer;
pub mod shading;
pub mod texture;
pub mod tiles;
pub mod vertex;

pub use context::{
    Bindings, ContextState, RenderContext, UniformValue, Uniforms, MAX_TEXTURE_SLOTS, MVP_UNIFORM,
};
pub use framebuffer::{FrameSlice, Framebuffer, FAR_DEPTH};
pub use integrator::{Coverage, RayIntegrator, TraceConfig, TraceStats};
pub use rasterizer::{PixelTarget, RasterConfig, RasterStats, Rasterizer, EDGE_EPSILON};
pub use renderer::{
    FrameStats, HybridRenderer, Rasterize, RenderConfig, RenderMode, TraceRadiance,
};
pub use shading::{argb_to_color, color_to_argb, Color, ShadingConfig, ToneMap};
pub use texture::{ConstantTexture, ImageTexture, Texture, TextureFilter};
pub use tiles::{FrameTile, TileBins, DEFAULT_TILE_SIZE};
pub use vertex::{ProjectedTriangle, RasterVertex};
