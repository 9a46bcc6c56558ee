//! Path storage: polygon vertex container.
//!
//! Stores straight-line sub-paths as a flat list of vertices tagged with path
//! commands. Only `move_to`, `line_to` and `close_polygon` are needed by the
//! probe geometry, so curves are not supported.

use crate::basics::{
    is_end_poly, is_move_to, is_stop, is_vertex, PointD, RectD, VertexSource, PATH_CMD_END_POLY,
    PATH_CMD_LINE_TO, PATH_CMD_MOVE_TO, PATH_CMD_STOP, PATH_FLAGS_CLOSE,
};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vertex {
    x: f64,
    y: f64,
    cmd: u32,
}

/// An ordered sequence of path vertices, possibly containing several
/// sub-paths. Implements `VertexSource` for the rasterizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathStorage {
    vertices: Vec<Vertex>,
    iterator: usize,
}

impl PathStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a closed polygon from a list of points.
    pub fn from_polygon(points: &[PointD]) -> Self {
        let mut path = Self::new();
        let mut iter = points.iter();
        if let Some(first) = iter.next() {
            path.move_to(first.x, first.y);
            for p in iter {
                path.line_to(p.x, p.y);
            }
            path.close_polygon();
        }
        path
    }

    // ---------------------------------------------------------------
    // Path construction
    // ---------------------------------------------------------------

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.vertices.push(Vertex {
            x,
            y,
            cmd: PATH_CMD_MOVE_TO,
        });
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.vertices.push(Vertex {
            x,
            y,
            cmd: PATH_CMD_LINE_TO,
        });
    }

    /// Close the current sub-path. Does nothing if the last command is not a vertex.
    pub fn close_polygon(&mut self) {
        if is_vertex(self.last_command()) {
            self.vertices.push(Vertex {
                x: 0.0,
                y: 0.0,
                cmd: PATH_CMD_END_POLY | PATH_FLAGS_CLOSE,
            });
        }
    }

    pub fn total_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn last_command(&self) -> u32 {
        self.vertices.last().map_or(PATH_CMD_STOP, |v| v.cmd)
    }

    /// Translate every vertex of every sub-path.
    pub fn translate_all_paths(&mut self, dx: f64, dy: f64) {
        for v in &mut self.vertices {
            if is_vertex(v.cmd) {
                v.x += dx;
                v.y += dy;
            }
        }
    }

    /// Consuming variant of `translate_all_paths`.
    pub fn translated(mut self, dx: f64, dy: f64) -> Self {
        self.translate_all_paths(dx, dy);
        self
    }

    /// Closed polygons as point lists, one per sub-path.
    pub fn polygons(&self) -> Vec<Vec<PointD>> {
        let mut polys: Vec<Vec<PointD>> = Vec::new();
        for v in &self.vertices {
            if is_move_to(v.cmd) {
                polys.push(vec![PointD::new(v.x, v.y)]);
            } else if is_vertex(v.cmd) {
                match polys.last_mut() {
                    Some(poly) => poly.push(PointD::new(v.x, v.y)),
                    None => polys.push(vec![PointD::new(v.x, v.y)]),
                }
            }
        }
        polys.retain(|p| p.len() >= 3);
        polys
    }

    /// Bounding box of all vertices, or `None` for an empty path.
    pub fn bounding_rect(&self) -> Option<RectD> {
        let mut iter = self.vertices.iter().filter(|v| is_vertex(v.cmd));
        let first = iter.next()?;
        let mut r = RectD::new(first.x, first.y, first.x, first.y);
        for v in iter {
            r.x1 = r.x1.min(v.x);
            r.y1 = r.y1.min(v.y);
            r.x2 = r.x2.max(v.x);
            r.y2 = r.y2.max(v.y);
        }
        Some(r)
    }

    /// Non-zero winding number of all sub-paths around `(x, y)`.
    ///
    /// Upward edges include their lower endpoint and exclude the upper one,
    /// so a point on a shared vertex is counted exactly once.
    pub fn winding_number(&self, x: f64, y: f64) -> i32 {
        let mut winding = 0;
        for poly in self.polygons() {
            let n = poly.len();
            for i in 0..n {
                let a = poly[i];
                let b = poly[(i + 1) % n];
                if a.y <= y {
                    if b.y > y && is_left(a, b, x, y) > 0.0 {
                        winding += 1;
                    }
                } else if b.y <= y && is_left(a, b, x, y) < 0.0 {
                    winding -= 1;
                }
            }
        }
        winding
    }

    /// Non-zero fill containment test.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.winding_number(x, y) != 0
    }
}

#[inline]
fn is_left(a: PointD, b: PointD, x: f64, y: f64) -> f64 {
    (b.x - a.x) * (y - a.y) - (x - a.x) * (b.y - a.y)
}

impl VertexSource for PathStorage {
    fn rewind(&mut self, path_id: u32) {
        self.iterator = path_id as usize;
    }

    fn vertex(&mut self, x: &mut f64, y: &mut f64) -> u32 {
        let Some(v) = self.vertices.get(self.iterator) else {
            return PATH_CMD_STOP;
        };
        self.iterator += 1;
        if !is_end_poly(v.cmd) && !is_stop(v.cmd) {
            *x = v.x;
            *y = v.y;
        }
        v.cmd
    }
}

// ============================================================================
// Tests
// ============================================================================
