//! Polygon scanline rasterizer.
//!
//! Accepts closed outlines in device coordinates, converts them to cells and
//! sweeps the cells row by row into a [`Scanline`]. Coverage is the exact
//! area fraction of each pixel covered by the outline, in `0..=255`.
//!
//! With anti-aliasing disabled the same coverage is thresholded at
//! [`COVER_THRESHOLD`], so a pixel is either fully in or fully out depending
//! on whether at least half of it is covered.

use tracing::trace;

use crate::basics::{
    is_close, is_move_to, is_stop, is_vertex, poly_coord, CoverType, FillingRule, RectI,
    VertexSource, COVER_FULL, COVER_NONE, COVER_THRESHOLD, POLY_SUBPIXEL_SHIFT,
};
use crate::rasterizer_cells_aa::{Cell, CellRasterizer};

const AA_SHIFT: u32 = 8;
const AA_SCALE: i32 = 1 << AA_SHIFT;
const AA_MASK: i32 = AA_SCALE - 1;
const AA_SCALE2: i32 = AA_SCALE * 2;
const AA_MASK2: i32 = AA_SCALE2 - 1;

// ============================================================================
// Scanline trait
// ============================================================================

/// Receiver for the spans produced by [`ScanlineRasterizer::sweep_scanline`].
///
/// Cells and spans arrive in increasing `x` within one row.
pub trait Scanline {
    /// Start a new row.
    fn reset_spans(&mut self);

    /// One pixel at `x` with coverage `cover`.
    fn add_cell(&mut self, x: i32, cover: u32);

    /// `len` pixels starting at `x`, all with coverage `cover`.
    fn add_span(&mut self, x: i32, len: u32, cover: u32);

    /// Close the row at `y`.
    fn finalize(&mut self, y: i32);

    fn num_spans(&self) -> u32;

    fn y(&self) -> i32;
}

// ============================================================================
// ScanlineRasterizer
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Status {
    Initial,
    MoveTo,
    LineTo,
    Closed,
}

/// Outline rasterizer producing per-pixel coverage.
///
/// Typical use: [`add_path`](Self::add_path) one or more shapes, then either
/// [`rewind_scanlines`](Self::rewind_scanlines) followed by repeated
/// [`sweep_scanline`](Self::sweep_scanline), or point queries through
/// [`coverage_at`](Self::coverage_at).
#[derive(Debug, Clone)]
pub struct ScanlineRasterizer {
    outline: CellRasterizer,
    filling_rule: FillingRule,
    anti_alias: bool,
    start_x: i32,
    start_y: i32,
    cursor: (i32, i32),
    status: Status,
    scan_y: i32,
}

impl ScanlineRasterizer {
    pub fn new() -> Self {
        Self {
            outline: CellRasterizer::new(),
            filling_rule: FillingRule::NonZero,
            anti_alias: true,
            start_x: 0,
            start_y: 0,
            cursor: (0, 0),
            status: Status::Initial,
            scan_y: 0,
        }
    }

    /// Discard all outlines. Settings are kept.
    pub fn reset(&mut self) {
        self.outline.reset();
        self.status = Status::Initial;
    }

    pub fn filling_rule(&mut self, rule: FillingRule) {
        self.filling_rule = rule;
    }

    /// Select fractional coverage (`true`) or thresholded coverage (`false`).
    pub fn set_anti_alias(&mut self, anti_alias: bool) {
        self.anti_alias = anti_alias;
    }

    pub fn anti_alias(&self) -> bool {
        self.anti_alias
    }

    // ------------------------------------------------------------------------
    // Outline construction
    // ------------------------------------------------------------------------

    pub fn close_polygon(&mut self) {
        if self.status == Status::LineTo {
            let (x, y) = self.cursor;
            self.outline.line(x, y, self.start_x, self.start_y);
            self.cursor = (self.start_x, self.start_y);
            self.status = Status::Closed;
        }
    }

    /// Start a new contour, closing the previous one.
    pub fn move_to_d(&mut self, x: f64, y: f64) {
        if self.outline.sorted() {
            self.reset();
        }
        self.close_polygon();
        self.start_x = poly_coord(x);
        self.start_y = poly_coord(y);
        self.cursor = (self.start_x, self.start_y);
        self.status = Status::MoveTo;
    }

    pub fn line_to_d(&mut self, x: f64, y: f64) {
        let (x1, y1) = self.cursor;
        let (x2, y2) = (poly_coord(x), poly_coord(y));
        self.outline.line(x1, y1, x2, y2);
        self.cursor = (x2, y2);
        self.status = Status::LineTo;
    }

    pub fn add_vertex(&mut self, x: f64, y: f64, cmd: u32) {
        if is_move_to(cmd) {
            self.move_to_d(x, y);
        } else if is_vertex(cmd) {
            self.line_to_d(x, y);
        } else if is_close(cmd) {
            self.close_polygon();
        }
    }

    /// Add every contour of a vertex source.
    pub fn add_path(&mut self, vs: &mut dyn VertexSource, path_id: u32) {
        let (mut x, mut y) = (0.0, 0.0);
        vs.rewind(path_id);
        if self.outline.sorted() {
            self.reset();
        }
        loop {
            let cmd = vs.vertex(&mut x, &mut y);
            if is_stop(cmd) {
                break;
            }
            self.add_vertex(x, y, cmd);
        }
    }

    // ------------------------------------------------------------------------
    // Bounds
    // ------------------------------------------------------------------------

    pub fn min_x(&self) -> i32 {
        self.outline.min_x()
    }
    pub fn min_y(&self) -> i32 {
        self.outline.min_y()
    }
    pub fn max_x(&self) -> i32 {
        self.outline.max_x()
    }
    pub fn max_y(&self) -> i32 {
        self.outline.max_y()
    }

    /// Pixel bounds of everything added so far.
    pub fn bounds(&self) -> Option<RectI> {
        self.outline.bounds()
    }

    // ------------------------------------------------------------------------
    // Coverage
    // ------------------------------------------------------------------------

    /// Close the open contour and sort cells. Returns `false` when there is
    /// nothing to render.
    pub fn rewind_scanlines(&mut self) -> bool {
        self.close_polygon();
        self.outline.sort_cells();
        if self.outline.total_cells() == 0 {
            return false;
        }
        self.scan_y = self.outline.min_y();
        trace!(
            cells = self.outline.total_cells(),
            min_y = self.outline.min_y(),
            max_y = self.outline.max_y(),
            "rewind scanlines"
        );
        true
    }

    /// Map an accumulated area to a coverage value.
    #[inline]
    pub fn calculate_alpha(&self, area: i32) -> u32 {
        let mut cover = (area >> (POLY_SUBPIXEL_SHIFT * 2 + 1 - AA_SHIFT)).abs();
        if self.filling_rule == FillingRule::EvenOdd {
            cover &= AA_MASK2;
            if cover > AA_SCALE {
                cover = AA_SCALE2 - cover;
            }
        }
        let cover = cover.min(AA_MASK) as u32;
        if self.anti_alias {
            cover
        } else if cover >= COVER_THRESHOLD as u32 {
            COVER_FULL as u32
        } else {
            COVER_NONE as u32
        }
    }

    /// Emit the next non-empty row into `sl`. Returns `false` once every row
    /// has been consumed.
    pub fn sweep_scanline<SL: Scanline>(&mut self, sl: &mut SL) -> bool {
        loop {
            if self.scan_y > self.outline.max_y() {
                return false;
            }
            sl.reset_spans();
            self.sweep_row(self.scan_y, sl);
            if sl.num_spans() > 0 {
                break;
            }
            self.scan_y += 1;
        }
        sl.finalize(self.scan_y);
        self.scan_y += 1;
        true
    }

    fn sweep_row<SL: Scanline>(&self, y: i32, sl: &mut SL) {
        let cells = self.outline.row(y);
        let mut cover = 0;
        let mut i = 0;
        while i < cells.len() {
            let x = cells[i].x;
            let (area, delta, n) = merge_column(&cells[i..]);
            cover += delta;
            i += n;

            let mut span_x = x;
            if area != 0 {
                let alpha = self.calculate_alpha((cover << (POLY_SUBPIXEL_SHIFT + 1)) - area);
                if alpha != 0 {
                    sl.add_cell(x, alpha);
                }
                span_x = x + 1;
            }

            if let Some(next) = cells.get(i) {
                if next.x > span_x {
                    let alpha = self.calculate_alpha(cover << (POLY_SUBPIXEL_SHIFT + 1));
                    if alpha != 0 {
                        sl.add_span(span_x, (next.x - span_x) as u32, alpha);
                    }
                }
            }
        }
    }

    /// Coverage of the single pixel `(x, y)`.
    pub fn coverage_at(&mut self, x: i32, y: i32) -> CoverType {
        self.close_polygon();
        self.outline.sort_cells();
        let cells = self.outline.row(y);
        let mut cover = 0;
        let mut i = 0;
        while i < cells.len() && cells[i].x <= x {
            let cx = cells[i].x;
            let (area, delta, n) = merge_column(&cells[i..]);
            cover += delta;
            i += n;
            if cx == x {
                return self.calculate_alpha((cover << (POLY_SUBPIXEL_SHIFT + 1)) - area)
                    as CoverType;
            }
        }
        self.calculate_alpha(cover << (POLY_SUBPIXEL_SHIFT + 1)) as CoverType
    }

    /// True when `(x, y)` receives any coverage.
    pub fn hit_test(&mut self, x: i32, y: i32) -> bool {
        self.coverage_at(x, y) != COVER_NONE
    }
}

impl Default for ScanlineRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Sum the run of cells sharing the first cell's column.
/// Returns `(area, cover, cells consumed)`.
#[inline]
fn merge_column(cells: &[Cell]) -> (i32, i32, usize) {
    let x = cells[0].x;
    let mut area = 0;
    let mut cover = 0;
    let mut n = 0;
    for c in cells.iter().take_while(|c| c.x == x) {
        area += c.area;
        cover += c.cover;
        n += 1;
    }
    (area, cover, n)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basics::{PointD, RectD};
    use crate::path_storage::PathStorage;
    use crate::rounded_rect::RoundedRect;
    use crate::scanline_u::ScanlineU8;

    fn rect_path(x1: f64, y1: f64, x2: f64, y2: f64) -> PathStorage {
        PathStorage::from_polygon(&[
            PointD::new(x1, y1),
            PointD::new(x2, y1),
            PointD::new(x2, y2),
            PointD::new(x1, y2),
        ])
    }

    fn rasterize(path: &mut PathStorage, anti_alias: bool) -> ScanlineRasterizer {
        let mut ras = ScanlineRasterizer::new();
        ras.set_anti_alias(anti_alias);
        ras.add_path(path, 0);
        ras
    }

    #[test]
    fn test_calculate_alpha_ranges() {
        let ras = ScanlineRasterizer::new();
        assert_eq!(ras.calculate_alpha(0), 0);
        assert_eq!(ras.calculate_alpha(256 << 9), 255);
        assert_eq!(ras.calculate_alpha(-(256 << 9)), 255);
        assert_eq!(ras.calculate_alpha(128 << 9), 128);
    }

    #[test]
    fn test_calculate_alpha_thresholded() {
        let mut ras = ScanlineRasterizer::new();
        ras.set_anti_alias(false);
        assert_eq!(ras.calculate_alpha(128 << 9), 255);
        assert_eq!(ras.calculate_alpha(127 << 9), 0);
        assert_eq!(ras.calculate_alpha(0), 0);
    }

    #[test]
    fn test_calculate_alpha_even_odd() {
        let mut ras = ScanlineRasterizer::new();
        ras.filling_rule(FillingRule::EvenOdd);
        assert_eq!(ras.calculate_alpha(512 << 9), 0);
    }

    #[test]
    fn test_aligned_rect_is_fully_covered() {
        let mut path = rect_path(2.0, 3.0, 6.0, 5.0);
        let mut ras = rasterize(&mut path, true);
        assert_eq!(ras.coverage_at(2, 3), 255);
        assert_eq!(ras.coverage_at(5, 4), 255);
        assert_eq!(ras.coverage_at(6, 4), 0);
        assert_eq!(ras.coverage_at(1, 4), 0);
        assert_eq!(ras.coverage_at(3, 5), 0);
    }

    #[test]
    fn test_half_pixel_edges() {
        let mut path = rect_path(0.5, 0.5, 4.5, 4.5);
        let mut ras = rasterize(&mut path, true);
        assert_eq!(ras.coverage_at(2, 2), 255);
        assert_eq!(ras.coverage_at(0, 2), 128);
        assert_eq!(ras.coverage_at(4, 2), 128);
        assert_eq!(ras.coverage_at(0, 0), 64);
    }

    #[test]
    fn test_half_pixel_edges_aliased() {
        let mut path = rect_path(0.5, 0.5, 4.5, 4.5);
        let mut ras = rasterize(&mut path, false);
        assert_eq!(ras.coverage_at(0, 2), 255);
        assert_eq!(ras.coverage_at(4, 2), 255);
        assert_eq!(ras.coverage_at(0, 0), 0);
        assert!(ras.hit_test(2, 2));
        assert!(!ras.hit_test(0, 0));
    }

    #[test]
    fn test_sweep_matches_point_queries() {
        let mut rr = RoundedRect::new(RectD::new(1.5, 1.25, 20.5, 14.75), 4.0, 4.0);
        let mut ras = ScanlineRasterizer::new();
        ras.add_path(&mut rr, 0);
        assert!(ras.rewind_scanlines());

        let mut sl = ScanlineU8::new();
        sl.reset(ras.min_x(), ras.max_x());
        let mut swept = Vec::new();
        while ras.sweep_scanline(&mut sl) {
            for span in sl.spans() {
                for (i, &c) in sl.span_covers(span).iter().enumerate() {
                    swept.push((span.x + i as i32, sl.y(), c));
                }
            }
        }
        assert!(!swept.is_empty());
        for (x, y, c) in swept {
            assert_eq!(ras.coverage_at(x, y), c, "pixel ({x}, {y})");
        }
    }

    #[test]
    fn test_empty_rasterizer_has_no_scanlines() {
        let mut ras = ScanlineRasterizer::new();
        assert!(!ras.rewind_scanlines());
        assert_eq!(ras.bounds(), None);
        assert!(!ras.hit_test(0, 0));
    }

    #[test]
    fn test_adding_after_sort_resets() {
        let mut a = rect_path(0.0, 0.0, 2.0, 2.0);
        let mut b = rect_path(10.0, 10.0, 12.0, 12.0);
        let mut ras = ScanlineRasterizer::new();
        ras.add_path(&mut a, 0);
        assert!(ras.hit_test(1, 1));
        ras.add_path(&mut b, 0);
        assert!(!ras.hit_test(1, 1));
        assert!(ras.hit_test(11, 11));
    }

    #[test]
    fn test_move_to_closes_previous_contour() {
        let mut ras = ScanlineRasterizer::new();
        ras.move_to_d(0.0, 0.0);
        ras.line_to_d(4.0, 0.0);
        ras.line_to_d(4.0, 4.0);
        ras.line_to_d(0.0, 4.0);
        ras.move_to_d(10.0, 10.0);
        ras.line_to_d(12.0, 10.0);
        ras.line_to_d(12.0, 12.0);
        assert_eq!(ras.coverage_at(1, 1), 255);
        assert!(ras.hit_test(11, 10));
    }
}
