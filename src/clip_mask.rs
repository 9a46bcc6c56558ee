//! Coverage masks for clip regions.
//!
//! A `ClipMask` holds one coverage byte per device pixel. 255 means the
//! pixel is fully inside the clip, 0 fully outside. Replacing a clip writes
//! the shape's coverage; intersecting multiplies the existing coverage by
//! the shape's, so a pixel half-covered by two anti-aliased clips ends up
//! at roughly a quarter.

use crate::basics::{CoverType, RectI, COVER_NONE};
use crate::color::Rgba8;
use crate::rasterizer_scanline_aa::{Scanline, ScanlineRasterizer};
use crate::scanline_u::ScanlineU8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipMask {
    width: u32,
    height: u32,
    data: Vec<CoverType>,
}

impl ClipMask {
    /// A mask that blocks every pixel.
    pub fn closed(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![COVER_NONE; width as usize * height as usize],
        }
    }

    /// Coverage of the outline in `ras`, clipped to the mask extent.
    ///
    /// The rasterizer's anti-alias setting decides whether edge pixels get
    /// fractional or thresholded coverage.
    pub fn from_rasterizer(width: u32, height: u32, ras: &mut ScanlineRasterizer) -> Self {
        let mut mask = Self::closed(width, height);
        if !ras.rewind_scanlines() {
            return mask;
        }
        let mut sl = ScanlineU8::new();
        sl.reset(ras.min_x(), ras.max_x());
        while ras.sweep_scanline(&mut sl) {
            let y = sl.y();
            if y < 0 || y >= height as i32 {
                continue;
            }
            for span in sl.spans() {
                let covers = sl.span_covers(span);
                let x1 = span.x.max(0);
                let x2 = (span.x + span.len as i32).min(width as i32);
                if x1 >= x2 {
                    continue;
                }
                let src = &covers[(x1 - span.x) as usize..(x2 - span.x) as usize];
                mask.row_mut(y as u32)[x1 as usize..x2 as usize].copy_from_slice(src);
            }
        }
        mask
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn row(&self, y: u32) -> &[CoverType] {
        let start = y as usize * self.width as usize;
        &self.data[start..start + self.width as usize]
    }

    fn row_mut(&mut self, y: u32) -> &mut [CoverType] {
        let start = y as usize * self.width as usize;
        &mut self.data[start..start + self.width as usize]
    }

    /// Mask coverage at `(x, y)`; zero outside the mask.
    pub fn pixel(&self, x: i32, y: i32) -> CoverType {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return COVER_NONE;
        }
        self.row(y as u32)[x as usize]
    }

    /// Multiply `dst` (coverage for pixels starting at `(x, y)`) by the mask.
    pub fn combine_hspan(&self, x: i32, y: i32, dst: &mut [CoverType]) {
        for (i, c) in dst.iter_mut().enumerate() {
            *c = Rgba8::multiply(*c, self.pixel(x + i as i32, y));
        }
    }

    /// Multiply this mask by `other`, pixel by pixel.
    pub fn intersect(&mut self, other: &ClipMask) {
        for (a, &b) in self.data.iter_mut().zip(&other.data) {
            *a = Rgba8::multiply(*a, b);
        }
    }

    /// Number of pixels with non-zero coverage.
    pub fn covered_pixels(&self) -> usize {
        self.data.iter().filter(|&&c| c != COVER_NONE).count()
    }

    /// Smallest pixel rectangle containing every non-zero pixel.
    pub fn bounds(&self) -> Option<RectI> {
        let mut r: Option<RectI> = None;
        for y in 0..self.height {
            let row = self.row(y);
            let first = row.iter().position(|&c| c != COVER_NONE);
            let last = row.iter().rposition(|&c| c != COVER_NONE);
            if let (Some(x1), Some(x2)) = (first, last) {
                let (x1, x2, y) = (x1 as i32, x2 as i32, y as i32);
                r = Some(match r {
                    None => RectI::new(x1, y, x2, y),
                    Some(b) => RectI::new(b.x1.min(x1), b.y1, b.x2.max(x2), y),
                });
            }
        }
        r
    }
}

// ============================================================================
// Tests
// ============================================================================
