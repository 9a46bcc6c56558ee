//! Unpacked scanline with one coverage byte per pixel.
//!
//! The rasterizer appends cells and spans in increasing `x`; adjacent runs
//! merge into one span so the renderer blends each contiguous run once.

use crate::basics::CoverType;
use crate::rasterizer_scanline_aa::Scanline;

/// A horizontal run of pixels whose coverage lives at
/// `covers[cover_offset..cover_offset + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub x: i32,
    pub len: u32,
    pub cover_offset: usize,
}

/// Scanline storing per-pixel coverage for the row `y`.
///
/// [`reset`](Self::reset) sizes the cover buffer for an `x` range; the
/// rasterizer then fills it through the [`Scanline`] trait.
#[derive(Debug, Clone, Default)]
pub struct ScanlineU8 {
    min_x: i32,
    next_x: Option<i32>,
    y: i32,
    covers: Vec<CoverType>,
    spans: Vec<Span>,
}

impl ScanlineU8 {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepare for rows spanning pixel columns `min_x..=max_x`.
    pub fn reset(&mut self, min_x: i32, max_x: i32) {
        let len = (max_x - min_x + 2).max(0) as usize;
        if len > self.covers.len() {
            self.covers.resize(len, 0);
        }
        self.min_x = min_x;
        self.reset_spans();
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    /// Coverage values of one span.
    pub fn span_covers(&self, span: &Span) -> &[CoverType] {
        &self.covers[span.cover_offset..span.cover_offset + span.len as usize]
    }

    fn push_run(&mut self, x: i32, len: u32) {
        match self.spans.last_mut() {
            Some(last) if self.next_x == Some(x) => last.len += len,
            _ => self.spans.push(Span {
                x,
                len,
                cover_offset: (x - self.min_x) as usize,
            }),
        }
        self.next_x = Some(x + len as i32);
    }
}

impl Scanline for ScanlineU8 {
    fn reset_spans(&mut self) {
        self.spans.clear();
        self.next_x = None;
    }

    fn add_cell(&mut self, x: i32, cover: u32) {
        let offset = (x - self.min_x) as usize;
        self.covers[offset] = cover as CoverType;
        self.push_run(x, 1);
    }

    fn add_span(&mut self, x: i32, len: u32, cover: u32) {
        let offset = (x - self.min_x) as usize;
        self.covers[offset..offset + len as usize].fill(cover as CoverType);
        self.push_run(x, len);
    }

    fn finalize(&mut self, y: i32) {
        self.y = y;
    }

    fn num_spans(&self) -> u32 {
        self.spans.len() as u32
    }

    fn y(&self) -> i32 {
        self.y
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_empty() {
        let sl = ScanlineU8::new();
        assert_eq!(sl.num_spans(), 0);
        assert_eq!(sl.y(), 0);
    }

    #[test]
    fn test_adjacent_cells_merge() {
        let mut sl = ScanlineU8::new();
        sl.reset(0, 100);
        sl.add_cell(10, 100);
        sl.add_cell(11, 200);
        sl.add_cell(12, 150);
        assert_eq!(sl.num_spans(), 1);
        let span = sl.spans()[0];
        assert_eq!((span.x, span.len), (10, 3));
        assert_eq!(sl.span_covers(&span), &[100, 200, 150]);
    }

    #[test]
    fn test_gap_starts_new_span() {
        let mut sl = ScanlineU8::new();
        sl.reset(0, 100);
        sl.add_cell(10, 100);
        sl.add_cell(20, 200);
        assert_eq!(sl.num_spans(), 2);
        assert_eq!(sl.spans()[1].x, 20);
    }

    #[test]
    fn test_cell_then_span_merge() {
        let mut sl = ScanlineU8::new();
        sl.reset(-5, 50);
        sl.add_cell(-2, 64);
        sl.add_span(-1, 4, 255);
        sl.add_cell(3, 32);
        assert_eq!(sl.num_spans(), 1);
        let span = sl.spans()[0];
        assert_eq!((span.x, span.len), (-2, 6));
        assert_eq!(sl.span_covers(&span), &[64, 255, 255, 255, 255, 32]);
    }

    #[test]
    fn test_reset_spans_keeps_buffer() {
        let mut sl = ScanlineU8::new();
        sl.reset(0, 10);
        sl.add_span(0, 5, 255);
        sl.finalize(7);
        assert_eq!(sl.y(), 7);
        sl.reset_spans();
        assert_eq!(sl.num_spans(), 0);
        sl.add_cell(4, 9);
        assert_eq!(sl.spans()[0].x, 4);
    }
}
