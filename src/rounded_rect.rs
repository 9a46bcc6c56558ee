//! Rounded rectangle vertex generator.
//!
//! Emits a closed polygon for a rectangle whose four corners are elliptical
//! arcs of the same radii. An oval is the special case where the radii are
//! half the rectangle's width and height.

use crate::basics::{
    RectD, VertexSource, PATH_CMD_END_POLY, PATH_CMD_LINE_TO, PATH_CMD_MOVE_TO, PATH_CMD_STOP,
    PATH_FLAGS_CLOSE, PATH_FLAGS_CW,
};
use std::f64::consts::{FRAC_PI_2, PI};

/// Device pixels per unit; outlines are flattened in device space.
const APPROXIMATION_SCALE: f64 = 1.0;

// ============================================================================
// CornerArc
// ============================================================================

/// Flattens one quarter-ellipse into evenly spaced angular steps.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CornerArc {
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    start: f64,
    steps: u32,
    step: u32,
}

impl CornerArc {
    fn new(cx: f64, cy: f64, rx: f64, ry: f64, start: f64, scale: f64) -> Self {
        Self {
            cx,
            cy,
            rx,
            ry,
            start,
            steps: quarter_steps(rx, ry, scale),
            step: 0,
        }
    }

    /// Next point along the arc, endpoints included.
    fn next_point(&mut self) -> Option<(f64, f64)> {
        if self.step > self.steps {
            return None;
        }
        let a = self.start + FRAC_PI_2 * self.step as f64 / self.steps as f64;
        self.step += 1;
        Some((self.cx + a.cos() * self.rx, self.cy + a.sin() * self.ry))
    }
}

/// Segments per quarter turn so the chord deviation stays below 1/8 pixel
/// at the given approximation scale.
fn quarter_steps(rx: f64, ry: f64, scale: f64) -> u32 {
    let ra = (rx.abs() + ry.abs()) / 2.0;
    if ra <= 0.0 {
        return 1;
    }
    let da = (ra / (ra + 0.125 / scale)).acos() * 2.0;
    ((FRAC_PI_2 / da).ceil() as u32).max(1)
}

// ============================================================================
// RoundedRect
// ============================================================================

/// Rounded rectangle with uniform elliptical corner radii.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    rect: RectD,
    rx: f64,
    ry: f64,
    status: u32,
    arc: Option<CornerArc>,
}

impl RoundedRect {
    /// Create a rounded rectangle; radii are clamped to half the side lengths.
    pub fn new(rect: RectD, rx: f64, ry: f64) -> Self {
        let mut rect = rect;
        rect.normalize();
        let mut rr = Self {
            rect,
            rx: rx.max(0.0),
            ry: ry.max(0.0),
            status: 0,
            arc: None,
        };
        rr.normalize_radius();
        rr
    }

    /// An ellipse inscribed in `rect`.
    pub fn oval(rect: RectD) -> Self {
        Self::new(rect, rect.width().abs() / 2.0, rect.height().abs() / 2.0)
    }

    pub fn rect(&self) -> RectD {
        self.rect
    }

    pub fn radii(&self) -> (f64, f64) {
        (self.rx, self.ry)
    }

    /// True when the radii span the whole rectangle.
    pub fn is_oval(&self) -> bool {
        self.rx * 2.0 >= self.rect.width() && self.ry * 2.0 >= self.rect.height()
    }

    /// The same rounded rectangle translated by `(dx, dy)`.
    pub fn offset(&self, dx: f64, dy: f64) -> Self {
        let mut rr = *self;
        rr.rect = self.rect.offset(dx, dy);
        rr.status = 0;
        rr.arc = None;
        rr
    }

    fn normalize_radius(&mut self) {
        let half_w = self.rect.width() / 2.0;
        let half_h = self.rect.height() / 2.0;
        let k = (half_w / self.rx).min(half_h / self.ry).min(1.0);
        if k < 1.0 {
            self.rx *= k;
            self.ry *= k;
        }
    }

    /// Containment with half-open rectangle bounds and elliptical corners.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let r = &self.rect;
        if !r.contains(x, y) {
            return false;
        }
        if self.rx <= 0.0 || self.ry <= 0.0 {
            return true;
        }
        let cx = if x < r.x1 + self.rx {
            r.x1 + self.rx
        } else if x > r.x2 - self.rx {
            r.x2 - self.rx
        } else {
            return true;
        };
        let cy = if y < r.y1 + self.ry {
            r.y1 + self.ry
        } else if y > r.y2 - self.ry {
            r.y2 - self.ry
        } else {
            return true;
        };
        let dx = (x - cx) / self.rx;
        let dy = (y - cy) / self.ry;
        dx * dx + dy * dy <= 1.0
    }

    fn corner(&self, index: u32) -> CornerArc {
        let r = &self.rect;
        let (cx, cy, start) = match index {
            0 => (r.x1 + self.rx, r.y1 + self.ry, PI),
            1 => (r.x2 - self.rx, r.y1 + self.ry, PI + FRAC_PI_2),
            2 => (r.x2 - self.rx, r.y2 - self.ry, 0.0),
            _ => (r.x1 + self.rx, r.y2 - self.ry, FRAC_PI_2),
        };
        CornerArc::new(cx, cy, self.rx, self.ry, start, APPROXIMATION_SCALE)
    }
}

impl VertexSource for RoundedRect {
    fn rewind(&mut self, _path_id: u32) {
        self.status = 0;
        self.arc = None;
    }

    // Corners in screen order: top-left, top-right, bottom-right, bottom-left.
    fn vertex(&mut self, x: &mut f64, y: &mut f64) -> u32 {
        loop {
            match self.status {
                0..=3 => {
                    let corner = self.status;
                    let mut arc = self.arc.take().unwrap_or_else(|| self.corner(corner));
                    if let Some((px, py)) = arc.next_point() {
                        *x = px;
                        *y = py;
                        let first = corner == 0 && arc.step == 1;
                        self.arc = Some(arc);
                        return if first {
                            PATH_CMD_MOVE_TO
                        } else {
                            PATH_CMD_LINE_TO
                        };
                    }
                    self.arc = None;
                    self.status += 1;
                }
                4 => {
                    self.status += 1;
                    return PATH_CMD_END_POLY | PATH_FLAGS_CLOSE | PATH_FLAGS_CW;
                }
                _ => return PATH_CMD_STOP,
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
    use crate::basics::{is_close, is_stop, is_vertex};

    fn collect(rr: &mut RoundedRect) -> (Vec<(f64, f64)>, u32) {
        rr.rewind(0);
        let mut pts = Vec::new();
        let mut last = 0;
        let (mut x, mut y) = (0.0, 0.0);
        loop {
            let cmd = rr.vertex(&mut x, &mut y);
            if is_stop(cmd) {
                break;
            }
            if is_vertex(cmd) {
                pts.push((x, y));
            }
            last = cmd;
        }
        (pts, last)
    }

    #[test]
    fn test_radius_clamped_to_half_side() {
        let rr = RoundedRect::new(RectD::new(0.0, 0.0, 10.0, 40.0), 20.0, 20.0);
        assert_eq!(rr.radii(), (5.0, 5.0));
    }

    #[test]
    fn test_oval_is_oval() {
        let rr = RoundedRect::oval(RectD::new(100.5, 100.5, 299.5, 299.5));
        assert!(rr.is_oval());
        assert_eq!(rr.radii(), (99.5, 99.5));
    }

    #[test]
    fn test_vertices_stay_in_bounds_and_close() {
        let mut rr = RoundedRect::new(RectD::new(10.0, 20.0, 110.0, 70.0), 10.0, 10.0);
        let (pts, last) = collect(&mut rr);
        assert!(pts.len() > 8);
        assert!(is_close(last));
        for (x, y) in pts {
            assert!((10.0 - 1e-9..=110.0 + 1e-9).contains(&x));
            assert!((20.0 - 1e-9..=70.0 + 1e-9).contains(&y));
        }
    }

    #[test]
    fn test_first_vertex_is_top_left_arc_start() {
        let mut rr = RoundedRect::new(RectD::new(0.0, 0.0, 100.0, 100.0), 10.0, 10.0);
        rr.rewind(0);
        let (mut x, mut y) = (0.0, 0.0);
        assert_eq!(rr.vertex(&mut x, &mut y), PATH_CMD_MOVE_TO);
        assert!((x - 0.0).abs() < 1e-9);
        assert!((y - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_vertices_visit_every_corner() {
        let mut rr = RoundedRect::new(RectD::new(0.0, 0.0, 100.0, 60.0), 10.0, 10.0);
        let steps = quarter_steps(10.0, 10.0, APPROXIMATION_SCALE);
        let (pts, last) = collect(&mut rr);
        assert_eq!(pts.len() as u32, 4 * (steps + 1));
        assert!(is_close(last));
        // Each corner arc ends on the next straight edge.
        let ends = [(10.0, 0.0), (100.0, 10.0), (90.0, 60.0), (0.0, 50.0)];
        for (i, (ex, ey)) in ends.iter().enumerate() {
            let (x, y) = pts[(i as u32 * (steps + 1) + steps) as usize];
            assert!((x - ex).abs() < 1e-9 && (y - ey).abs() < 1e-9, "corner {i}: ({x}, {y})");
        }
        // A second pass after rewind yields the same outline.
        assert_eq!(collect(&mut rr).0, pts);
    }

    #[test]
    fn test_zero_radius_is_rectangle() {
        let mut rr = RoundedRect::new(RectD::new(0.0, 0.0, 4.0, 4.0), 0.0, 0.0);
        let (pts, _) = collect(&mut rr);
        for (x, y) in &pts {
            assert!(*x == 0.0 || *x == 4.0);
            assert!(*y == 0.0 || *y == 4.0);
        }
    }

    #[test]
    fn test_contains_respects_corners() {
        let rr = RoundedRect::new(RectD::new(0.0, 0.0, 100.0, 100.0), 10.0, 10.0);
        assert!(rr.contains(50.0, 50.0));
        assert!(rr.contains(5.0, 50.0));
        assert!(!rr.contains(0.5, 0.5));
        assert!(!rr.contains(2.0, 2.0));
        assert!(rr.contains(4.0, 4.0));
        assert!(!rr.contains(100.0, 50.0));
    }

    #[test]
    fn test_offset_moves_rect() {
        let rr = RoundedRect::new(RectD::new(0.0, 0.0, 10.0, 10.0), 2.0, 2.0).offset(0.5, 0.25);
        assert_eq!(rr.rect(), RectD::new(0.5, 0.25, 10.5, 10.25));
        assert_eq!(rr.radii(), (2.0, 2.0));
    }
}
