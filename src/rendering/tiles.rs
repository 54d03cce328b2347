/// Screen tiles for parallel rasterization
///
/// The screen is cut into square tiles. Each visible triangle is binned into
/// every tile its pixel bounds overlap, in submission order. A tile copies
/// its region of the framebuffer (color and depth) into private buffers,
/// rasterizes its bin, and is flushed back afterwards, so no two workers
/// ever write the same pixel and submission order is kept per pixel.
use rayon::prelude::*;

use super::framebuffer::Framebuffer;
use super::rasterizer::{DrawStats, PixelTarget, Rasterizer};
use super::texture::Texture;
use super::vertex::ProjectedTriangle;
use crate::math::PixelRect;
use glam::IVec2;

/// Default tile side in pixels (128x128 color + depth = 128KB, L2 sized)
pub const DEFAULT_TILE_SIZE: usize = 128;

/// Tile-local copy of a framebuffer region
pub struct FrameTile {
    /// Top-left X coordinate in framebuffer space
    pub x0: usize,
    /// Top-left Y coordinate in framebuffer space
    pub y0: usize,
    /// May be less than the tile size at the right and bottom edges
    pub width: usize,
    pub height: usize,
    pub color: Box<[u32]>,
    pub depth: Box<[f32]>,
}

impl FrameTile {
    /// Copy a region of the framebuffer into a new tile.
    pub fn load(
        framebuffer: &Framebuffer,
        x0: usize,
        y0: usize,
        width: usize,
        height: usize,
    ) -> Self {
        let mut color = Vec::with_capacity(width * height);
        let mut depth = Vec::with_capacity(width * height);
        for y in y0..y0 + height {
            let start = framebuffer.index(x0, y);
            color.extend_from_slice(&framebuffer.color_buffer[start..start + width]);
            depth.extend_from_slice(&framebuffer.depth_buffer[start..start + width]);
        }

        Self {
            x0,
            y0,
            width,
            height,
            color: color.into_boxed_slice(),
            depth: depth.into_boxed_slice(),
        }
    }

    #[inline]
    fn local_index(&self, local_x: usize, local_y: usize) -> usize {
        local_y * self.width + local_x
    }

    /// Write color and depth back to the framebuffer.
    pub fn flush_to_framebuffer(&self, framebuffer: &mut Framebuffer) {
        for y in 0..self.height {
            let src = y * self.width;
            let dst = framebuffer.index(self.x0, self.y0 + y);

            framebuffer.color_buffer[dst..dst + self.width]
                .copy_from_slice(&self.color[src..src + self.width]);
            framebuffer.depth_buffer[dst..dst + self.width]
                .copy_from_slice(&self.depth[src..src + self.width]);
        }
    }
}

impl PixelTarget for FrameTile {
    #[inline]
    fn rect(&self) -> PixelRect {
        PixelRect {
            min: IVec2::new(self.x0 as i32, self.y0 as i32),
            max: IVec2::new(
                (self.x0 + self.width) as i32 - 1,
                (self.y0 + self.height) as i32 - 1,
            ),
        }
    }

    #[inline]
    fn test_depth_and_get_index(&mut self, x: usize, y: usize, rhw: f32) -> Option<usize> {
        // Convert to tile-local coordinates
        let local_x = x.wrapping_sub(self.x0);
        let local_y = y.wrapping_sub(self.y0);

        if local_x >= self.width || local_y >= self.height {
            return None;
        }

        let idx = self.local_index(local_x, local_y);
        if rhw > self.depth[idx] {
            self.depth[idx] = rhw;
            Some(idx)
        } else {
            None
        }
    }

    #[inline]
    fn write_color(&mut self, index: usize, color: u32) {
        self.color[index] = color;
    }
}

/// Per-tile triangle lists
pub struct TileBins {
    pub width: usize,
    pub height: usize,
    pub tile_size: usize,
    pub tiles_x: usize,
    pub tiles_y: usize,
    /// tile index -> indices into the projected triangle list, ascending
    pub bins: Vec<Vec<usize>>,
}

impl TileBins {
    /// The tile size is clamped to `1..=max(width, height)`.
    pub fn new(fb_width: usize, fb_height: usize, tile_size: usize) -> Self {
        let tile_size = tile_size.clamp(1, fb_width.max(fb_height).max(1));
        let tiles_x = fb_width.div_ceil(tile_size);
        let tiles_y = fb_height.div_ceil(tile_size);

        Self {
            width: fb_width,
            height: fb_height,
            tile_size,
            tiles_x,
            tiles_y,
            bins: vec![Vec::new(); tiles_x * tiles_y],
        }
    }

    #[inline]
    pub fn tile_count(&self) -> usize {
        self.bins.len()
    }

    /// Add a triangle to every tile its bounds overlap.
    /// Returns false if the bounds miss the screen entirely.
    pub fn add(&mut self, id: usize, bounds: PixelRect) -> bool {
        let rect = bounds.clamp(&PixelRect::screen(self.width, self.height));
        if rect.is_empty() {
            return false;
        }

        let size = self.tile_size as i32;
        for ty in (rect.min.y / size)..=(rect.max.y / size) {
            for tx in (rect.min.x / size)..=(rect.max.x / size) {
                let tile_idx = ty as usize * self.tiles_x + tx as usize;
                self.bins[tile_idx].push(id);
            }
        }
        true
    }

    #[inline]
    pub fn bin(&self, tile_x: usize, tile_y: usize) -> &[usize] {
        &self.bins[tile_y * self.tiles_x + tile_x]
    }

    /// (x0, y0, width, height) of a tile, clipped to the framebuffer.
    #[inline]
    pub fn tile_rect(&self, tile_x: usize, tile_y: usize) -> (usize, usize, usize, usize) {
        let x0 = tile_x * self.tile_size;
        let y0 = tile_y * self.tile_size;
        let x1 = (x0 + self.tile_size).min(self.width);
        let y1 = (y0 + self.tile_size).min(self.height);

        (x0, y0, x1 - x0, y1 - y0)
    }
}

/// Bin the triangles, rasterize all non-empty tiles in parallel and flush
/// them into the framebuffer.
pub fn render_tiles(
    rasterizer: &Rasterizer,
    triangles: &[ProjectedTriangle],
    texture: &dyn Texture,
    framebuffer: &mut Framebuffer,
) -> DrawStats {
    crate::perf_scope!("render_tiles");
    let mut bins = TileBins::new(
        framebuffer.width,
        framebuffer.height,
        rasterizer.config.tile_size,
    );
    for (id, tri) in triangles.iter().enumerate() {
        bins.add(id, tri.bounds);
    }

    let mut work_items: Vec<(usize, usize)> = Vec::new();
    for ty in 0..bins.tiles_y {
        for tx in 0..bins.tiles_x {
            if !bins.bin(tx, ty).is_empty() {
                work_items.push((tx, ty));
            }
        }
    }

    log::trace!(
        "rasterizing {} triangles across {}/{} tiles",
        triangles.len(),
        work_items.len(),
        bins.tile_count()
    );

    let source: &Framebuffer = framebuffer;
    let tiles: Vec<(FrameTile, DrawStats)> = work_items
        .into_par_iter()
        .map(|(tx, ty)| {
            let (x0, y0, tile_w, tile_h) = bins.tile_rect(tx, ty);
            let mut tile = FrameTile::load(source, x0, y0, tile_w, tile_h);
            let mut stats = DrawStats::default();

            for &id in bins.bin(tx, ty) {
                let drawn = rasterizer.draw_triangle(&triangles[id], texture, &mut tile);
                stats.tested += drawn.tested;
                stats.written += drawn.written;
            }

            (tile, stats)
        })
        .collect();

    let mut total = DrawStats::default();
    for (tile, stats) in &tiles {
        tile.flush_to_framebuffer(framebuffer);
        total.tested += stats.tested;
        total.written += stats.written;
    }
    total
}
