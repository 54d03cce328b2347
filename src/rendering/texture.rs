/// Textures sampled by the fragment stage and the ray integrator.
///
/// Texel (0, 0) is the top-left of the image; texture coordinates have
/// v = 0 at the bottom row. Addressing wraps (repeat) in both directions.
use glam::Vec3;

use super::shading::Color;
use crate::error::{RenderError, Result};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum TextureFilter {
    Nearest,
    #[default]
    Bilinear,
}

pub trait Texture: Send + Sync {
    fn sample_nearest(&self, u: f32, v: f32) -> Color;

    fn sample_bilinear(&self, u: f32, v: f32) -> Color;

    #[inline]
    fn sample(&self, u: f32, v: f32, filter: TextureFilter) -> Color {
        match filter {
            TextureFilter::Nearest => self.sample_nearest(u, v),
            TextureFilter::Bilinear => self.sample_bilinear(u, v),
        }
    }
}

/// Single color everywhere
#[derive(Copy, Clone, Debug)]
pub struct ConstantTexture {
    pub color: Color,
}

impl ConstantTexture {
    pub fn new(color: Color) -> Self {
        Self { color }
    }
}

impl Texture for ConstantTexture {
    #[inline]
    fn sample_nearest(&self, _u: f32, _v: f32) -> Color {
        self.color
    }

    #[inline]
    fn sample_bilinear(&self, _u: f32, _v: f32) -> Color {
        self.color
    }
}

/// In-memory RGB image, row-major from the top-left texel
#[derive(Clone, Debug)]
pub struct ImageTexture {
    width: usize,
    height: usize,
    texels: Vec<Color>,
}

impl ImageTexture {
    pub fn new(width: usize, height: usize, texels: Vec<Color>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidTexture(format!(
                "empty texture {}x{}",
                width, height
            )));
        }
        if texels.len() != width * height {
            return Err(RenderError::InvalidTexture(format!(
                "{} texels for {}x{}",
                texels.len(),
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// 1x1 texture of one color
    pub fn solid(color: Color) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
        }
    }

    /// `cells` x `cells` checkerboard; the top-left cell is `a`.
    pub fn checkerboard(size: usize, cells: usize, a: Color, b: Color) -> Result<Self> {
        let cells = cells.max(1);
        let cell = (size / cells).max(1);
        let texels = (0..size * size)
            .map(|i| {
                let x = (i % size) / cell;
                let y = (i / size) / cell;
                if (x + y) % 2 == 0 {
                    a
                } else {
                    b
                }
            })
            .collect();
        Self::new(size, size, texels)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Texel at integer coordinates, wrapped into range.
    #[inline]
    pub fn texel(&self, x: i64, y: i64) -> Color {
        let xi = x.rem_euclid(self.width as i64) as usize;
        let yi = y.rem_euclid(self.height as i64) as usize;
        self.texels[yi * self.width + xi]
    }

    /// Continuous texel-space coordinates of (u, v); texel centers sit at +0.5.
    #[inline]
    fn texel_space(&self, u: f32, v: f32) -> (f32, f32) {
        (u * self.width as f32, (1.0 - v) * self.height as f32)
    }
}

impl Texture for ImageTexture {
    fn sample_nearest(&self, u: f32, v: f32) -> Color {
        let (x, y) = self.texel_space(u, v);
        self.texel(x.floor() as i64, y.floor() as i64)
    }

    fn sample_bilinear(&self, u: f32, v: f32) -> Color {
        let (x, y) = self.texel_space(u, v);
        let x = x - 0.5;
        let y = y - 0.5;
        let x0 = x.floor();
        let y0 = y.floor();
        let fx = x - x0;
        let fy = y - y0;
        let (x0, y0) = (x0 as i64, y0 as i64);

        let c00 = self.texel(x0, y0);
        let c10 = self.texel(x0 + 1, y0);
        let c01 = self.texel(x0, y0 + 1);
        let c11 = self.texel(x0 + 1, y0 + 1);

        let top = c00.lerp(c10, fx);
        let bottom = c01.lerp(c11, fx);
        top.lerp(bottom, fy)
    }
}

impl From<Vec3> for ConstantTexture {
    fn from(color: Vec3) -> Self {
        Self::new(color)
    }
}
