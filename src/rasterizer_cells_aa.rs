//! Edge-to-cell conversion.
//!
//! Line segments in 24.8 fixed point are walked across the pixel grid and
//! accumulated into cells. Each cell records how much the outline crosses it
//! vertically (`cover`) and the signed area the crossing fragment leaves to
//! its left (`area`). Sweeping the sorted cells of a row left to right
//! yields the exact coverage of every pixel on that row.

use std::ops::Range;

use crate::basics::{RectI, POLY_SUBPIXEL_MASK, POLY_SUBPIXEL_SCALE, POLY_SUBPIXEL_SHIFT};

const SCALE: i32 = POLY_SUBPIXEL_SCALE as i32;
const MASK: i32 = POLY_SUBPIXEL_MASK as i32;

/// Segments with a horizontal extent above this are split in half so the
/// area products stay inside `i32`.
const DX_LIMIT: i64 = 16384 << POLY_SUBPIXEL_SHIFT;

// ============================================================================
// Cell
// ============================================================================

/// Accumulated edge contribution for one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
    pub cover: i32,
    pub area: i32,
}

impl Cell {
    const UNSET: Cell = Cell {
        x: i32::MAX,
        y: i32::MAX,
        cover: 0,
        area: 0,
    };

    #[inline]
    fn is_at(&self, x: i32, y: i32) -> bool {
        self.x == x && self.y == y
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.cover == 0 && self.area == 0
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::UNSET
    }
}

// ============================================================================
// CellRasterizer
// ============================================================================

/// Accumulates cells for a set of closed outlines.
///
/// Cells are appended as edges are added and only become queryable per row
/// after [`sort_cells`](Self::sort_cells). Adding another edge after sorting
/// requires a [`reset`](Self::reset).
#[derive(Debug, Clone)]
pub struct CellRasterizer {
    cells: Vec<Cell>,
    rows: Vec<Range<usize>>,
    curr: Cell,
    min_x: i32,
    min_y: i32,
    max_x: i32,
    max_y: i32,
    sorted: bool,
}

impl CellRasterizer {
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            rows: Vec::new(),
            curr: Cell::UNSET,
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
            sorted: false,
        }
    }

    /// Discard every cell, keeping allocations.
    pub fn reset(&mut self) {
        self.cells.clear();
        self.rows.clear();
        self.curr = Cell::UNSET;
        self.min_x = i32::MAX;
        self.min_y = i32::MAX;
        self.max_x = i32::MIN;
        self.max_y = i32::MIN;
        self.sorted = false;
    }

    #[inline]
    pub fn min_x(&self) -> i32 {
        self.min_x
    }
    #[inline]
    pub fn min_y(&self) -> i32 {
        self.min_y
    }
    #[inline]
    pub fn max_x(&self) -> i32 {
        self.max_x
    }
    #[inline]
    pub fn max_y(&self) -> i32 {
        self.max_y
    }

    /// Pixel bounds touched by the edges so far, or `None` when empty.
    pub fn bounds(&self) -> Option<RectI> {
        (self.min_x <= self.max_x && self.min_y <= self.max_y)
            .then(|| RectI::new(self.min_x, self.min_y, self.max_x, self.max_y))
    }

    #[inline]
    pub fn total_cells(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn sorted(&self) -> bool {
        self.sorted
    }

    /// Cells of row `y` ordered by `x`. Empty before sorting or outside the
    /// bounds.
    pub fn row(&self, y: i32) -> &[Cell] {
        if !self.sorted || y < self.min_y || y > self.max_y {
            return &[];
        }
        match self.rows.get((y - self.min_y) as usize) {
            Some(range) => &self.cells[range.clone()],
            None => &[],
        }
    }

    // ------------------------------------------------------------------------
    // Cell bookkeeping
    // ------------------------------------------------------------------------

    #[inline]
    fn flush_curr(&mut self) {
        if !self.curr.is_empty() {
            self.cells.push(self.curr);
        }
    }

    #[inline]
    fn set_curr(&mut self, x: i32, y: i32) {
        if !self.curr.is_at(x, y) {
            self.flush_curr();
            self.curr = Cell {
                x,
                y,
                cover: 0,
                area: 0,
            };
        }
    }

    #[inline]
    fn accumulate(&mut self, cover: i32, area: i32) {
        self.curr.cover += cover;
        self.curr.area += area;
    }

    fn extend_bounds(&mut self, x: i32, y: i32) {
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    // ------------------------------------------------------------------------
    // Edge walking
    // ------------------------------------------------------------------------

    /// Walk a segment inside row `ey`. `y1`/`y2` are the fractional heights
    /// within the row, `x1`/`x2` are full 24.8 coordinates.
    fn render_hline(&mut self, ey: i32, x1: i32, y1: i32, x2: i32, y2: i32) {
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let fx1 = x1 & MASK;
        let fx2 = x2 & MASK;

        if y1 == y2 {
            self.set_curr(ex2, ey);
            return;
        }

        if ex1 == ex2 {
            let delta = y2 - y1;
            self.accumulate(delta, (fx1 + fx2) * delta);
            return;
        }

        let dy = (y2 - y1) as i64;
        let mut dx = x2 as i64 - x1 as i64;
        let (mut p, first, incr) = if dx < 0 {
            dx = -dx;
            (fx1 as i64 * dy, 0, -1)
        } else {
            ((SCALE - fx1) as i64 * dy, SCALE, 1)
        };

        let (mut delta, mut modulo) = floor_div(p, dx);
        self.accumulate(delta, (fx1 + first) * delta);

        let mut ex = ex1 + incr;
        self.set_curr(ex, ey);
        let mut y = y1 + delta;

        if ex != ex2 {
            p = SCALE as i64 * (y2 - y + delta) as i64;
            let (lift, rem) = floor_div(p, dx);
            modulo -= dx;

            while ex != ex2 {
                delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dx;
                    delta += 1;
                }
                self.accumulate(delta, SCALE * delta);
                y += delta;
                ex += incr;
                self.set_curr(ex, ey);
            }
        }

        delta = y2 - y;
        self.accumulate(delta, (fx2 + SCALE - first) * delta);
    }

    /// Add one edge in 24.8 fixed point.
    pub fn line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        let dx = x2 as i64 - x1 as i64;
        if dx >= DX_LIMIT || dx <= -DX_LIMIT {
            let cx = ((x1 as i64 + x2 as i64) >> 1) as i32;
            let cy = ((y1 as i64 + y2 as i64) >> 1) as i32;
            self.line(x1, y1, cx, cy);
            self.line(cx, cy, x2, y2);
            return;
        }

        let dy = y2 as i64 - y1 as i64;
        let ex1 = x1 >> POLY_SUBPIXEL_SHIFT;
        let ex2 = x2 >> POLY_SUBPIXEL_SHIFT;
        let mut ey1 = y1 >> POLY_SUBPIXEL_SHIFT;
        let ey2 = y2 >> POLY_SUBPIXEL_SHIFT;
        let fy1 = y1 & MASK;
        let fy2 = y2 & MASK;

        self.extend_bounds(ex1, ey1);
        self.extend_bounds(ex2, ey2);
        self.set_curr(ex1, ey1);

        if ey1 == ey2 {
            self.render_hline(ey1, x1, fy1, x2, fy2);
            return;
        }

        let (first, incr) = if dy < 0 { (0, -1) } else { (SCALE, 1) };

        // Vertical edges stay in one column.
        if dx == 0 {
            let two_fx = (x1 - (ex1 << POLY_SUBPIXEL_SHIFT)) << 1;

            let mut delta = first - fy1;
            self.accumulate(delta, two_fx * delta);
            ey1 += incr;
            self.set_curr(ex1, ey1);

            delta = first + first - SCALE;
            let area = two_fx * delta;
            while ey1 != ey2 {
                self.curr.cover = delta;
                self.curr.area = area;
                ey1 += incr;
                self.set_curr(ex1, ey1);
            }

            delta = fy2 - SCALE + first;
            self.accumulate(delta, two_fx * delta);
            return;
        }

        let dy_abs = dy.abs();
        let p = if dy < 0 {
            fy1 as i64 * dx
        } else {
            (SCALE - fy1) as i64 * dx
        };
        let (delta, mut modulo) = floor_div(p, dy_abs);

        let mut x_from = x1 + delta;
        self.render_hline(ey1, x1, fy1, x_from, first);
        ey1 += incr;
        self.set_curr(x_from >> POLY_SUBPIXEL_SHIFT, ey1);

        if ey1 != ey2 {
            let (lift, rem) = floor_div(SCALE as i64 * dx, dy_abs);
            modulo -= dy_abs;

            while ey1 != ey2 {
                let mut delta = lift;
                modulo += rem;
                if modulo >= 0 {
                    modulo -= dy_abs;
                    delta += 1;
                }
                let x_to = x_from + delta;
                self.render_hline(ey1, x_from, SCALE - first, x_to, first);
                x_from = x_to;
                ey1 += incr;
                self.set_curr(x_from >> POLY_SUBPIXEL_SHIFT, ey1);
            }
        }
        self.render_hline(ey1, x_from, SCALE - first, x2, fy2);
    }

    /// Flush the pending cell and order all cells by row then column.
    pub fn sort_cells(&mut self) {
        if self.sorted {
            return;
        }
        self.flush_curr();
        self.curr = Cell::UNSET;
        self.sorted = true;

        if self.cells.is_empty() {
            return;
        }

        self.cells.sort_unstable_by_key(|c| (c.y, c.x));

        let height = (self.max_y - self.min_y + 1) as usize;
        self.rows.clear();
        self.rows.resize(height, 0..0);
        let mut start = 0;
        while start < self.cells.len() {
            let y = self.cells[start].y;
            let len = self.cells[start..].iter().take_while(|c| c.y == y).count();
            self.rows[(y - self.min_y) as usize] = start..start + len;
            start += len;
        }
    }
}

impl Default for CellRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Division rounding toward negative infinity, returning `(quotient, remainder)`.
#[inline]
fn floor_div(p: i64, d: i64) -> (i32, i64) {
    let mut q = (p / d) as i32;
    let mut r = p % d;
    if r < 0 {
        q -= 1;
        r += d;
    }
    (q, r)
}

// ============================================================================
// Tests
// ============================================================================
