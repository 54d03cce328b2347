/// Framebuffer shared by the rasterizer and the ray integrator.
///
/// Color is ARGB32, row-major from the top-left pixel. Depth stores the
/// reciprocal of clip-space w (rhw): larger is closer, and a cleared pixel
/// holds `FAR_DEPTH`, which loses against any visible fragment.
use crate::math::PixelRect;

/// Depth value of a pixel no fragment has been written to.
pub const FAR_DEPTH: f32 = 0.0;

/// View into a contiguous set of rows in the framebuffer.
/// Used for multi-core rendering where each worker owns a disjoint slice.
pub struct FrameSlice<'a> {
    pub width: usize,
    pub y0: usize,
    pub height: usize,
    pub color: &'a mut [u32],
    pub depth: &'a mut [f32],
}

impl<'a> FrameSlice<'a> {
    /// Local buffer index of global pixel (x, y), if it lies in this slice.
    #[inline]
    pub fn local_index(&self, x: usize, y_global: usize) -> Option<usize> {
        if x >= self.width || y_global < self.y0 {
            return None;
        }
        let y_local = y_global - self.y0;
        if y_local >= self.height {
            return None;
        }
        Some(y_local * self.width + x)
    }

    /// Write color and depth together at a local index.
    #[inline]
    pub fn write(&mut self, index: usize, color: u32, depth: f32) {
        self.color[index] = color;
        self.depth[index] = depth;
    }

    #[inline]
    pub fn depth_at(&self, index: usize) -> f32 {
        self.depth[index]
    }

    /// Global row range covered by this slice.
    #[inline]
    pub fn rows(&self) -> std::ops::Range<usize> {
        self.y0..self.y0 + self.height
    }
}

pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    // Separate allocations: the depth pass touches only depth
    pub color_buffer: Vec<u32>, // ARGB format
    pub depth_buffer: Vec<f32>, // rhw
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        let pixel_count = width * height;
        Self {
            width,
            height,
            color_buffer: vec![0xFF000000; pixel_count],
            depth_buffer: vec![FAR_DEPTH; pixel_count],
        }
    }

    /// Clear color and depth buffers
    pub fn clear(&mut self, clear_color: u32) {
        self.color_buffer.fill(clear_color);
        self.depth_buffer.fill(FAR_DEPTH);
    }

    /// Valid pixel rectangle
    #[inline]
    pub fn screen_rect(&self) -> PixelRect {
        PixelRect::screen(self.width, self.height)
    }

    #[inline]
    pub fn index(&self, x: usize, y: usize) -> usize {
        x + y * self.width
    }

    #[inline]
    pub fn color_at(&self, x: usize, y: usize) -> u32 {
        self.color_buffer[self.index(x, y)]
    }

    #[inline]
    pub fn depth_at(&self, x: usize, y: usize) -> f32 {
        self.depth_buffer[self.index(x, y)]
    }

    /// Set pixel with depth test (larger rhw wins)
    #[inline]
    pub fn set_pixel(&mut self, x: usize, y: usize, color: u32, rhw: f32) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }

        let index = self.index(x, y);
        if rhw > self.depth_buffer[index] {
            self.depth_buffer[index] = rhw;
            self.color_buffer[index] = color;
            true
        } else {
            false
        }
    }

    /// Number of pixels that still hold the cleared depth
    pub fn uncovered_pixels(&self) -> usize {
        self.depth_buffer.iter().filter(|&&d| d == FAR_DEPTH).count()
    }

    /// Split the framebuffer into horizontal stripes for multi-core rendering.
    /// Each stripe owns a disjoint subset of rows, so they can be rendered in parallel.
    pub fn split_into_stripes(&mut self, stripes: usize) -> Vec<FrameSlice<'_>> {
        let stripes = stripes.max(1);
        let width = self.width;
        let height = self.height;

        let mut slices = Vec::with_capacity(stripes);

        let mut remaining_color: &mut [u32] = self.color_buffer.as_mut_slice();
        let mut remaining_depth: &mut [f32] = self.depth_buffer.as_mut_slice();

        let mut y0 = 0usize;
        let rows_per_stripe = height.div_ceil(stripes);

        while y0 < height {
            let rows = (height - y0).min(rows_per_stripe);
            let pixels = rows * width;

            let (color_head, color_tail) =
                std::mem::take(&mut remaining_color).split_at_mut(pixels);
            let (depth_head, depth_tail) =
                std::mem::take(&mut remaining_depth).split_at_mut(pixels);

            slices.push(FrameSlice {
                width,
                y0,
                height: rows,
                color: color_head,
                depth: depth_head,
            });

            remaining_color = color_tail;
            remaining_depth = depth_tail;
            y0 += rows;
        }

        slices
    }
}
