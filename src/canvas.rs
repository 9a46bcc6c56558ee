//! Render targets.
//!
//! [`RenderTarget`] is the narrow drawing contract the probe needs: a state
//! stack, shape clipping, and solid shape fills. [`Canvas`] implements it on
//! top of the scanline rasterizer, keeping the current clip as a coverage
//! mask in each saved state. [`SaveGuard`] scopes a save/restore pair to a
//! Rust scope.

use std::ops::{Deref, DerefMut};

use tracing::{debug, trace};

use crate::basics::RectD;
use crate::clip_mask::ClipMask;
use crate::color::Rgba8;
use crate::error::Result;
use crate::geometry::{ClipOp, ClipSpec, Shape};
use crate::pixfmt_rgba::PixfmtRgba32;
use crate::rasterizer_scanline_aa::ScanlineRasterizer;
use crate::renderer_base::RendererBase;
use crate::renderer_scanline::render_scanlines_aa_solid;
use crate::rendering_buffer::RenderingBuffer;
use crate::scanline_u::ScanlineU8;

// ============================================================================
// RenderTarget
// ============================================================================

/// Drawing surface with a save/restore clip stack.
///
/// Save counts start at 1 for a fresh target; `save` returns the count
/// before saving, which can later be passed to `restore_to_count`.
pub trait RenderTarget {
    /// Width and height in device pixels.
    fn device_size(&self) -> (u32, u32);

    /// Push the current state. Returns the save count before the push.
    fn save(&mut self) -> usize;

    /// Pop one state. Does nothing at the base level.
    fn restore(&mut self);

    fn save_count(&self) -> usize;

    /// Pop states until `save_count() == count` (never below 1).
    fn restore_to_count(&mut self, count: usize) {
        let target = count.max(1);
        while self.save_count() > target {
            self.restore();
        }
    }

    /// Combine `shape` into the current clip.
    fn clip_shape(&mut self, shape: &Shape, op: ClipOp, anti_alias: bool);

    /// Fill `shape` with `color`, honoring the current clip.
    fn fill_shape(&mut self, shape: &Shape, color: Rgba8, anti_alias: bool);

    /// Fill an axis-aligned rectangle without anti-aliasing.
    fn fill_rect(&mut self, rect: RectD, color: Rgba8) {
        self.fill_shape(&Shape::Rect(rect), color, false);
    }

    /// Apply every step of `spec` in order.
    fn clip_spec(&mut self, spec: &ClipSpec) {
        for step in spec {
            self.clip_shape(&step.shape, step.op, step.anti_alias);
        }
    }
}

// ============================================================================
// SaveGuard
// ============================================================================

/// Restores the target to its save count at creation when dropped.
///
/// ```
/// use clipmatch::{Canvas, RenderTarget, SaveGuard};
///
/// let mut canvas = Canvas::new(8, 8).unwrap();
/// {
///     let mut guard = SaveGuard::new(&mut canvas);
///     guard.save();
///     assert_eq!(guard.save_count(), 3);
/// }
/// assert_eq!(canvas.save_count(), 1);
/// ```
pub struct SaveGuard<'a, T: RenderTarget + ?Sized> {
    target: &'a mut T,
    count: usize,
}

impl<'a, T: RenderTarget + ?Sized> SaveGuard<'a, T> {
    pub fn new(target: &'a mut T) -> Self {
        let count = target.save();
        Self { target, count }
    }

    /// Save count the target returns to on drop.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl<T: RenderTarget + ?Sized> Deref for SaveGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.target
    }
}

impl<T: RenderTarget + ?Sized> DerefMut for SaveGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.target
    }
}

impl<T: RenderTarget + ?Sized> Drop for SaveGuard<'_, T> {
    fn drop(&mut self) {
        self.target.restore_to_count(self.count);
    }
}

// ============================================================================
// Canvas
// ============================================================================

#[derive(Debug, Clone, Default)]
struct CanvasState {
    /// `None` means unclipped.
    clip: Option<ClipMask>,
}

/// Software render target drawing into an owned RGBA buffer.
#[derive(Debug, Clone)]
pub struct Canvas {
    buf: RenderingBuffer,
    current_state: CanvasState,
    state_stack: Vec<CanvasState>,
    ras: ScanlineRasterizer,
    sl: ScanlineU8,
}

impl Canvas {
    /// A transparent canvas of `width × height` pixels.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            buf: RenderingBuffer::new(width, height)?,
            current_state: CanvasState::default(),
            state_stack: Vec::new(),
            ras: ScanlineRasterizer::new(),
            sl: ScanlineU8::new(),
        })
    }

    pub fn width(&self) -> u32 {
        self.buf.width()
    }

    pub fn height(&self) -> u32 {
        self.buf.height()
    }

    /// Overwrite every pixel, ignoring the clip.
    pub fn clear(&mut self, color: Rgba8) {
        PixfmtRgba32::new(&mut self.buf).clear(&color);
    }

    /// Color at `(x, y)`, or `None` outside the surface.
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba8> {
        if x < 0 || y < 0 || x >= self.width() as i32 || y >= self.height() as i32 {
            return None;
        }
        let off = x as usize * 4;
        let row = self.buf.row(y as u32);
        Some(Rgba8::rgba(row[off], row[off + 1], row[off + 2], row[off + 3]))
    }

    /// The current clip mask, if any clip is active.
    pub fn clip_mask(&self) -> Option<&ClipMask> {
        self.current_state.clip.as_ref()
    }

    pub fn buffer(&self) -> &RenderingBuffer {
        &self.buf
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.buf.as_bytes()
    }

    pub fn into_buffer(self) -> RenderingBuffer {
        self.buf
    }

    /// Coverage mask of `shape` over the whole surface.
    fn coverage_mask(&mut self, shape: &Shape, anti_alias: bool) -> ClipMask {
        self.ras.reset();
        self.ras.set_anti_alias(anti_alias);
        shape.rasterize(&mut self.ras);
        ClipMask::from_rasterizer(self.width(), self.height(), &mut self.ras)
    }
}

impl RenderTarget for Canvas {
    fn device_size(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    fn save(&mut self) -> usize {
        let count = self.save_count();
        self.state_stack.push(self.current_state.clone());
        count
    }

    fn restore(&mut self) {
        if let Some(state) = self.state_stack.pop() {
            self.current_state = state;
        }
    }

    fn save_count(&self) -> usize {
        self.state_stack.len() + 1
    }

    fn clip_shape(&mut self, shape: &Shape, op: ClipOp, anti_alias: bool) {
        let mask = self.coverage_mask(shape, anti_alias);
        debug!(
            ?op,
            anti_alias,
            covered = mask.covered_pixels(),
            depth = self.save_count(),
            "clip"
        );
        self.current_state.clip = match (op, self.current_state.clip.take()) {
            (ClipOp::Intersect, Some(mut existing)) => {
                existing.intersect(&mask);
                Some(existing)
            }
            (ClipOp::Intersect, None) | (ClipOp::Replace, _) => Some(mask),
        };
    }

    fn fill_shape(&mut self, shape: &Shape, color: Rgba8, anti_alias: bool) {
        trace!(?color, anti_alias, bounds = ?shape.bounds(), "fill");
        self.ras.reset();
        self.ras.set_anti_alias(anti_alias);
        shape.rasterize(&mut self.ras);

        let mut ren = RendererBase::new(PixfmtRgba32::new(&mut self.buf));
        ren.set_mask(self.current_state.clip.as_ref());
        render_scanlines_aa_solid(&mut self.ras, &mut self.sl, &mut ren, &color);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::{PointD, RectI};
    use crate::rounded_rect::RoundedRect;

    fn canvas() -> Canvas {
        let mut c = Canvas::new(40, 40).unwrap();
        c.clear(Rgba8::WHITE);
        c
    }

    fn rect(x1: f64, y1: f64, x2: f64, y2: f64) -> Shape {
        Shape::Rect(RectD::new(x1, y1, x2, y2))
    }

    #[test]
    fn test_save_counts() {
        let mut c = canvas();
        assert_eq!(c.save_count(), 1);
        assert_eq!(c.save(), 1);
        assert_eq!(c.save(), 2);
        assert_eq!(c.save_count(), 3);
        c.restore_to_count(2);
        assert_eq!(c.save_count(), 2);
        c.restore();
        c.restore();
        assert_eq!(c.save_count(), 1);
        c.restore_to_count(0);
        assert_eq!(c.save_count(), 1);
    }

    #[test]
    fn test_fill_rect_without_clip() {
        let mut c = canvas();
        c.fill_rect(RectD::new(10.0, 10.0, 20.0, 20.0), Rgba8::BLACK);
        assert_eq!(c.pixel(10, 10), Some(Rgba8::BLACK));
        assert_eq!(c.pixel(19, 19), Some(Rgba8::BLACK));
        assert_eq!(c.pixel(20, 20), Some(Rgba8::WHITE));
        assert_eq!(c.pixel(40, 0), None);
    }

    #[test]
    fn test_clip_replace_limits_fill() {
        let mut c = canvas();
        c.clip_shape(&rect(5.0, 5.0, 15.0, 15.0), ClipOp::Replace, false);
        c.fill_rect(RectD::from_size(40.0, 40.0), Rgba8::RED);
        assert_eq!(c.pixel(5, 5), Some(Rgba8::RED));
        assert_eq!(c.pixel(14, 14), Some(Rgba8::RED));
        assert_eq!(c.pixel(15, 15), Some(Rgba8::WHITE));
        assert_eq!(c.pixel(0, 0), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_clip_intersect() {
        let mut c = canvas();
        c.clip_shape(&rect(0.0, 0.0, 20.0, 20.0), ClipOp::Replace, true);
        c.clip_shape(&rect(10.0, 10.0, 30.0, 30.0), ClipOp::Intersect, true);
        c.fill_rect(RectD::from_size(40.0, 40.0), Rgba8::RED);
        assert_eq!(c.pixel(15, 15), Some(Rgba8::RED));
        assert_eq!(c.pixel(5, 5), Some(Rgba8::WHITE));
        assert_eq!(c.pixel(25, 25), Some(Rgba8::WHITE));
        assert_eq!(
            c.clip_mask().and_then(|m| m.bounds()),
            Some(RectI::new(10, 10, 19, 19))
        );
    }

    #[test]
    fn test_intersect_without_clip_acts_as_replace() {
        let mut c = canvas();
        c.clip_shape(&rect(2.0, 2.0, 4.0, 4.0), ClipOp::Intersect, false);
        assert_eq!(c.clip_mask().map(|m| m.covered_pixels()), Some(4));
    }

    #[test]
    fn test_restore_drops_clip() {
        let mut c = canvas();
        let count = c.save();
        c.clip_shape(&rect(0.0, 0.0, 1.0, 1.0), ClipOp::Replace, false);
        assert!(c.clip_mask().is_some());
        c.restore_to_count(count);
        assert!(c.clip_mask().is_none());
        c.fill_rect(RectD::from_size(40.0, 40.0), Rgba8::BLACK);
        assert_eq!(c.pixel(30, 30), Some(Rgba8::BLACK));
    }

    #[test]
    fn test_save_guard_restores_on_drop() {
        let mut c = canvas();
        {
            let mut guard = SaveGuard::new(&mut c);
            assert_eq!(guard.count(), 1);
            guard.clip_shape(&rect(0.0, 0.0, 2.0, 2.0), ClipOp::Replace, false);
            guard.save();
            guard.save();
        }
        assert_eq!(c.save_count(), 1);
        assert!(c.clip_mask().is_none());
    }

    #[test]
    fn test_save_guard_restores_on_early_return() {
        fn clipped_fill(target: &mut dyn RenderTarget, bail: bool) -> Option<()> {
            let mut guard = SaveGuard::new(target);
            guard.clip_shape(&Shape::Rect(RectD::new(0.0, 0.0, 5.0, 5.0)), ClipOp::Replace, false);
            if bail {
                return None;
            }
            guard.fill_rect(RectD::from_size(40.0, 40.0), Rgba8::RED);
            Some(())
        }
        let mut c = canvas();
        assert!(clipped_fill(&mut c, true).is_none());
        assert_eq!(c.save_count(), 1);
        assert!(clipped_fill(&mut c, false).is_some());
        assert_eq!(c.pixel(1, 1), Some(Rgba8::RED));
        assert_eq!(c.pixel(6, 6), Some(Rgba8::WHITE));
        assert!(c.clip_mask().is_none());
    }

    #[test]
    fn test_aa_fill_partial_edge() {
        let mut c = canvas();
        c.fill_shape(&rect(10.5, 10.0, 20.0, 20.0), Rgba8::BLACK, true);
        let p = c.pixel(10, 15).unwrap();
        assert!(p.r > 0 && p.r < 255, "got {p:?}");
        c.fill_shape(&rect(30.5, 10.0, 35.0, 20.0), Rgba8::BLACK, false);
        assert_eq!(c.pixel(30, 15), Some(Rgba8::BLACK));
    }

    #[test]
    fn test_oval_clip_matches_oval_fill() {
        let oval = Shape::RRect(RoundedRect::oval(RectD::new(4.5, 4.5, 35.5, 35.5)));
        let mut clipped = canvas();
        clipped.clip_shape(&oval, ClipOp::Replace, false);
        clipped.fill_rect(RectD::from_size(40.0, 40.0), Rgba8::BLACK);
        let mut direct = canvas();
        direct.fill_shape(&oval, Rgba8::BLACK, false);
        assert_eq!(clipped.as_bytes(), direct.as_bytes());
        assert!(oval.contains(PointD::new(20.0, 20.0)));
    }
}
