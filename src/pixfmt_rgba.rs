//! RGBA32 pixel format with alpha blending.
//!
//! Provides the `PixelFormat` trait and `PixfmtRgba32`, which blends
//! non-premultiplied colors into a [`RenderingBuffer`]. Callers are expected
//! to clip coordinates first; `RendererBase` does that.

use crate::basics::CoverType;
use crate::color::Rgba8;
use crate::rendering_buffer::{RenderingBuffer, BPP};

// ============================================================================
// PixelFormat trait
// ============================================================================

/// Pixel-level write access to a surface.
pub trait PixelFormat {
    type ColorType;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    /// Blend a single pixel with color `c` at coverage `cover`.
    fn blend_pixel(&mut self, x: i32, y: i32, c: &Self::ColorType, cover: CoverType);

    /// Blend `len` pixels with uniform coverage.
    fn blend_hline(&mut self, x: i32, y: i32, len: u32, c: &Self::ColorType, cover: CoverType);

    /// Blend `len` pixels with per-pixel coverage.
    fn blend_solid_hspan(
        &mut self,
        x: i32,
        y: i32,
        len: u32,
        c: &Self::ColorType,
        covers: &[CoverType],
    );

    /// Overwrite `len` pixels with `c`.
    fn copy_hline(&mut self, x: i32, y: i32, len: u32, c: &Self::ColorType);

    fn pixel(&self, x: i32, y: i32) -> Self::ColorType;
}

// ============================================================================
// PixfmtRgba32
// ============================================================================

/// Non-premultiplied RGBA, component order R, G, B, A.
pub struct PixfmtRgba32<'a> {
    rbuf: &'a mut RenderingBuffer,
}

impl<'a> PixfmtRgba32<'a> {
    pub fn new(rbuf: &'a mut RenderingBuffer) -> Self {
        Self { rbuf }
    }

    /// Overwrite the whole surface with `c`.
    pub fn clear(&mut self, c: &Rgba8) {
        for y in 0..self.rbuf.height() {
            for px in self.rbuf.row_mut(y).chunks_exact_mut(BPP) {
                px.copy_from_slice(&c.to_array());
            }
        }
    }

    #[inline]
    fn pixel_mut(&mut self, x: i32, y: i32) -> &mut [u8] {
        let off = x as usize * BPP;
        &mut self.rbuf.row_mut(y as u32)[off..off + BPP]
    }

    #[inline]
    fn blend_pix(p: &mut [u8], c: &Rgba8, alpha: u8) {
        if alpha == 255 {
            p.copy_from_slice(&[c.r, c.g, c.b, 255]);
        } else if alpha > 0 {
            p[0] = Rgba8::lerp(p[0], c.r, alpha);
            p[1] = Rgba8::lerp(p[1], c.g, alpha);
            p[2] = Rgba8::lerp(p[2], c.b, alpha);
            p[3] = Rgba8::lerp(p[3], 255, alpha);
        }
    }
}

impl<'a> PixelFormat for PixfmtRgba32<'a> {
    type ColorType = Rgba8;

    fn width(&self) -> u32 {
        self.rbuf.width()
    }

    fn height(&self) -> u32 {
        self.rbuf.height()
    }

    fn pixel(&self, x: i32, y: i32) -> Rgba8 {
        let off = x as usize * BPP;
        let row = self.rbuf.row(y as u32);
        Rgba8::rgba(row[off], row[off + 1], row[off + 2], row[off + 3])
    }

    fn copy_hline(&mut self, x: i32, y: i32, len: u32, c: &Rgba8) {
        let start = x as usize * BPP;
        let row = self.rbuf.row_mut(y as u32);
        for px in row[start..start + len as usize * BPP].chunks_exact_mut(BPP) {
            px.copy_from_slice(&c.to_array());
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, c: &Rgba8, cover: CoverType) {
        let alpha = Rgba8::mult_cover(c.a, cover);
        Self::blend_pix(self.pixel_mut(x, y), c, alpha);
    }

    fn blend_hline(&mut self, x: i32, y: i32, len: u32, c: &Rgba8, cover: CoverType) {
        let alpha = Rgba8::mult_cover(c.a, cover);
        let start = x as usize * BPP;
        let row = self.rbuf.row_mut(y as u32);
        for px in row[start..start + len as usize * BPP].chunks_exact_mut(BPP) {
            Self::blend_pix(px, c, alpha);
        }
    }

    fn blend_solid_hspan(&mut self, x: i32, y: i32, len: u32, c: &Rgba8, covers: &[CoverType]) {
        let start = x as usize * BPP;
        let row = self.rbuf.row_mut(y as u32);
        let pixels = row[start..start + len as usize * BPP].chunks_exact_mut(BPP);
        for (px, &cover) in pixels.zip(covers) {
            Self::blend_pix(px, c, Rgba8::mult_cover(c.a, cover));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
