/// Fragment shading utilities shared by the rasterizer and the integrator.
/// Kept separate from both pipelines so the color path stays identical.
use glam::Vec3;

use super::texture::TextureFilter;

/// Linear RGB color
pub type Color = Vec3;

/// Mapping from linear radiance to displayable [0, 1] values
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ToneMap {
    /// Clamp each channel to [0, 1]
    #[default]
    Clamp,
    /// c / (1 + c), then clamp
    Reinhard,
}

impl ToneMap {
    #[inline]
    pub fn apply(self, color: Color) -> Color {
        match self {
            ToneMap::Clamp => color.clamp(Vec3::ZERO, Vec3::ONE),
            ToneMap::Reinhard => {
                let c = color.max(Vec3::ZERO);
                (c / (Vec3::ONE + c)).clamp(Vec3::ZERO, Vec3::ONE)
            }
        }
    }
}

/// Diffuse-texture shading configuration, shared by both pipelines.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ShadingConfig {
    /// Filter used when sampling the diffuse texture.
    pub filter: TextureFilter,
    pub tone_map: ToneMap,
}

impl Default for ShadingConfig {
    fn default() -> Self {
        Self {
            filter: TextureFilter::Bilinear,
            tone_map: ToneMap::Clamp,
        }
    }
}

impl ShadingConfig {
    /// Tone-map a linear color and pack it into ARGB32.
    #[inline]
    pub fn resolve(&self, color: Color) -> u32 {
        color_to_argb(self.tone_map.apply(color))
    }
}

/// Convert RGB to ARGB u32
#[inline]
pub const fn rgb_to_u32(r: u8, g: u8, b: u8) -> u32 {
    0xFF000000 | ((r as u32) << 16) | ((g as u32) << 8) | (b as u32)
}

/// Pack a [0, 1] color into opaque ARGB32, rounding to nearest.
#[inline]
pub fn color_to_argb(color: Color) -> u32 {
    let c = color.clamp(Vec3::ZERO, Vec3::ONE) * 255.0 + Vec3::splat(0.5);
    rgb_to_u32(c.x as u8, c.y as u8, c.z as u8)
}

/// Unpack ARGB32 into a [0, 1] color (alpha dropped).
#[inline]
pub fn argb_to_color(argb: u32) -> Color {
    let r = (argb >> 16) & 0xFF;
    let g = (argb >> 8) & 0xFF;
    let b = argb & 0xFF;
    Vec3::new(r as f32, g as f32, b as f32) / 255.0
}
