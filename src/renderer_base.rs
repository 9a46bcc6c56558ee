//! Base renderer with rectangular and mask clipping.
//!
//! Wraps a pixel format with a clip box (always within the surface) and an
//! optional [`ClipMask`]. Every span is trimmed to the box and, when a mask
//! is attached, its coverage is multiplied by the mask before blending.

use crate::basics::{CoverType, RectI};
use crate::clip_mask::ClipMask;
use crate::pixfmt_rgba::PixelFormat;

pub struct RendererBase<'m, PF: PixelFormat> {
    ren: PF,
    clip_box: RectI,
    mask: Option<&'m ClipMask>,
    scratch: Vec<CoverType>,
}

impl<'m, PF: PixelFormat> RendererBase<'m, PF> {
    /// Clip box starts at the full surface, with no mask.
    pub fn new(ren: PF) -> Self {
        let clip_box = RectI::new(0, 0, ren.width() as i32 - 1, ren.height() as i32 - 1);
        Self {
            ren,
            clip_box,
            mask: None,
            scratch: Vec::new(),
        }
    }

    pub fn width(&self) -> u32 {
        self.ren.width()
    }

    pub fn height(&self) -> u32 {
        self.ren.height()
    }

    /// Set the clip box, intersected with the surface. Returns `false` and
    /// clips everything when the intersection is empty.
    pub fn clip_box_i(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) -> bool {
        let mut cb = RectI::new(x1, y1, x2, y2);
        cb.normalize();
        let surface = RectI::new(0, 0, self.width() as i32 - 1, self.height() as i32 - 1);
        if cb.clip(&surface) {
            self.clip_box = cb;
            true
        } else {
            self.clip_box = RectI::new(1, 1, 0, 0);
            false
        }
    }

    /// Restore the full-surface clip box.
    pub fn reset_clipping(&mut self) {
        self.clip_box = RectI::new(0, 0, self.width() as i32 - 1, self.height() as i32 - 1);
    }

    pub fn clip_box(&self) -> &RectI {
        &self.clip_box
    }

    /// Attach or detach a coverage mask.
    pub fn set_mask(&mut self, mask: Option<&'m ClipMask>) {
        self.mask = mask;
    }

    #[inline]
    pub fn inbox(&self, x: i32, y: i32) -> bool {
        self.clip_box.hit_test(x, y)
    }

    pub fn ren(&self) -> &PF {
        &self.ren
    }

    pub fn ren_mut(&mut self) -> &mut PF {
        &mut self.ren
    }

    // ------------------------------------------------------------------------
    // Drawing
    // ------------------------------------------------------------------------

    /// Overwrite every pixel, ignoring the clip box and mask.
    pub fn clear(&mut self, c: &PF::ColorType) {
        let w = self.width();
        for y in 0..self.height() as i32 {
            self.ren.copy_hline(0, y, w, c);
        }
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<PF::ColorType> {
        (x >= 0 && y >= 0 && x < self.width() as i32 && y < self.height() as i32)
            .then(|| self.ren.pixel(x, y))
    }

    /// Blend `x1..=x2` on row `y` at uniform coverage.
    pub fn blend_hline(&mut self, x1: i32, y: i32, x2: i32, c: &PF::ColorType, cover: CoverType) {
        let (x1, x2) = (x1.min(x2), x1.max(x2));
        let len = x2 - x1 + 1;
        self.scratch.clear();
        self.scratch.resize(len as usize, cover);
        let covers = std::mem::take(&mut self.scratch);
        self.blend_solid_hspan(x1, y, len, c, &covers);
        self.scratch = covers;
    }

    /// Blend `len` pixels from `x` with per-pixel coverage.
    pub fn blend_solid_hspan(
        &mut self,
        mut x: i32,
        y: i32,
        mut len: i32,
        c: &PF::ColorType,
        covers: &[CoverType],
    ) {
        if y > self.clip_box.y2 || y < self.clip_box.y1 {
            return;
        }
        let mut offset = 0usize;
        if x < self.clip_box.x1 {
            let d = self.clip_box.x1 - x;
            len -= d;
            offset = d as usize;
            x = self.clip_box.x1;
        }
        if x + len > self.clip_box.x2 + 1 {
            len = self.clip_box.x2 - x + 1;
        }
        if len <= 0 {
            return;
        }
        let covers = &covers[offset..offset + len as usize];

        match self.mask {
            None => self.ren.blend_solid_hspan(x, y, len as u32, c, covers),
            Some(mask) => {
                self.scratch.clear();
                self.scratch.extend_from_slice(covers);
                mask.combine_hspan(x, y, &mut self.scratch);
                self.ren
                    .blend_solid_hspan(x, y, len as u32, c, &self.scratch);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::PointD;
    use crate::color::Rgba8;
    use crate::path_storage::PathStorage;
    use crate::pixfmt_rgba::PixfmtRgba32;
    use crate::rasterizer_scanline_aa::ScanlineRasterizer;
    use crate::rendering_buffer::RenderingBuffer;

    fn surface(w: u32, h: u32) -> RenderingBuffer {
        let mut buf = RenderingBuffer::new(w, h).unwrap();
        PixfmtRgba32::new(&mut buf).clear(&Rgba8::WHITE);
        buf
    }

    #[test]
    fn test_new_clip_box_is_surface() {
        let mut buf = surface(10, 8);
        let rb = RendererBase::new(PixfmtRgba32::new(&mut buf));
        assert_eq!(*rb.clip_box(), RectI::new(0, 0, 9, 7));
    }

    #[test]
    fn test_clip_box_invalid() {
        let mut buf = surface(10, 10);
        let mut rb = RendererBase::new(PixfmtRgba32::new(&mut buf));
        assert!(!rb.clip_box_i(20, 20, 30, 30));
        rb.blend_hline(0, 5, 9, &Rgba8::RED, 255);
        assert_eq!(rb.pixel(5, 5), Some(Rgba8::WHITE));
        rb.reset_clipping();
        rb.blend_hline(0, 5, 9, &Rgba8::RED, 255);
        assert_eq!(rb.pixel(5, 5), Some(Rgba8::RED));
    }

    #[test]
    fn test_blend_hline_clipped() {
        let mut buf = surface(10, 10);
        let mut rb = RendererBase::new(PixfmtRgba32::new(&mut buf));
        rb.blend_hline(-5, 3, 15, &Rgba8::BLACK, 255);
        assert_eq!(rb.pixel(0, 3), Some(Rgba8::BLACK));
        assert_eq!(rb.pixel(9, 3), Some(Rgba8::BLACK));
        assert_eq!(rb.pixel(0, 2), Some(Rgba8::WHITE));
        assert_eq!(rb.pixel(10, 3), None);
    }

    #[test]
    fn test_blend_solid_hspan_clipped_left() {
        let mut buf = surface(10, 10);
        let mut rb = RendererBase::new(PixfmtRgba32::new(&mut buf));
        rb.blend_solid_hspan(-2, 0, 4, &Rgba8::RED, &[255, 255, 0, 255]);
        assert_eq!(rb.pixel(0, 0), Some(Rgba8::WHITE));
        assert_eq!(rb.pixel(1, 0), Some(Rgba8::RED));
        assert_eq!(rb.pixel(2, 0), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_blend_solid_hspan_fully_clipped() {
        let mut buf = surface(10, 10);
        let mut rb = RendererBase::new(PixfmtRgba32::new(&mut buf));
        rb.blend_solid_hspan(-10, 0, 5, &Rgba8::RED, &[255; 5]);
        rb.blend_solid_hspan(12, 0, 5, &Rgba8::RED, &[255; 5]);
        rb.blend_solid_hspan(0, 11, 5, &Rgba8::RED, &[255; 5]);
        for x in 0..10 {
            assert_eq!(rb.pixel(x, 0), Some(Rgba8::WHITE));
        }
    }

    #[test]
    fn test_mask_limits_blending() {
        let mut path = PathStorage::from_polygon(&[
            PointD::new(0.0, 0.0),
            PointD::new(5.0, 0.0),
            PointD::new(5.0, 1.0),
            PointD::new(0.0, 1.0),
        ]);
        let mut ras = ScanlineRasterizer::new();
        ras.add_path(&mut path, 0);
        let mask = ClipMask::from_rasterizer(10, 1, &mut ras);

        let mut buf = surface(10, 1);
        let mut rb = RendererBase::new(PixfmtRgba32::new(&mut buf));
        rb.set_mask(Some(&mask));
        rb.blend_hline(0, 0, 9, &Rgba8::RED, 255);
        assert_eq!(rb.pixel(4, 0), Some(Rgba8::RED));
        assert_eq!(rb.pixel(5, 0), Some(Rgba8::WHITE));
        rb.set_mask(None);
        rb.blend_hline(0, 0, 9, &Rgba8::BLACK, 255);
        assert_eq!(rb.pixel(5, 0), Some(Rgba8::BLACK));
    }
}
