//! Probe geometry.
//!
//! Nine geometry kinds share one base square `[MIN, MAX]²`. For a kind and a
//! frame offset, [`build_drawable`] produces the shape filled directly and
//! [`build_clip_region`] produces the clip steps whose intersection should
//! cover exactly the same pixels. Both are pure functions of their inputs.
//!
//! Every shape also answers [`Shape::contains`] analytically, which lets
//! rendered output be checked without trusting the rasterizer.

use std::fmt;
use std::str::FromStr;

use crate::basics::{intersect_rectangles, PointD, RectD};
use crate::error::Error;
use crate::path_storage::PathStorage;
use crate::rasterizer_scanline_aa::ScanlineRasterizer;
use crate::rounded_rect::RoundedRect;

pub const MIN: f64 = 100.5;
pub const MID: f64 = 200.0;
pub const MAX: f64 = 299.5;

/// Corner radius of the rounded rect kinds.
pub const RRECT_RADIUS: f64 = 10.0;

/// Translation applied to the outer rect of compound kinds, on top of the
/// frame offset.
pub const COMPOUND_SHIFT: PointD = PointD::new(-100.0, -100.0);

/// The unoffset base square.
pub fn base_rect() -> RectD {
    RectD::new(MIN, MIN, MAX, MAX)
}

const CONVEX: [PointD; 3] = [
    PointD::new(MIN, MIN),
    PointD::new(MAX, MAX),
    PointD::new(MIN, MAX),
];

const CONCAVE: [PointD; 8] = [
    PointD::new(MIN, MIN),
    PointD::new(MID, 105.0),
    PointD::new(MAX, MIN),
    PointD::new(295.0, MID),
    PointD::new(MAX, MAX),
    PointD::new(MID, 295.0),
    PointD::new(MIN, MAX),
    PointD::new(105.0, MID),
];

// ============================================================================
// GeometryKind
// ============================================================================

/// The geometry under test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeometryKind {
    #[default]
    Rect,
    RRect,
    Circle,
    ConvexPath,
    ConcavePath,
    RectAndRect,
    RectAndRRect,
    RectAndConvex,
    RectAndConcave,
}

impl GeometryKind {
    /// Declaration order; index `i` is selected by key `'1' + i`.
    pub const ALL: [GeometryKind; 9] = [
        GeometryKind::Rect,
        GeometryKind::RRect,
        GeometryKind::Circle,
        GeometryKind::ConvexPath,
        GeometryKind::ConcavePath,
        GeometryKind::RectAndRect,
        GeometryKind::RectAndRRect,
        GeometryKind::RectAndConvex,
        GeometryKind::RectAndConcave,
    ];

    pub fn name(self) -> &'static str {
        match self {
            GeometryKind::Rect => "rect",
            GeometryKind::RRect => "rrect",
            GeometryKind::Circle => "circle",
            GeometryKind::ConvexPath => "convex",
            GeometryKind::ConcavePath => "concave",
            GeometryKind::RectAndRect => "rect-and-rect",
            GeometryKind::RectAndRRect => "rect-and-rrect",
            GeometryKind::RectAndConvex => "rect-and-convex",
            GeometryKind::RectAndConcave => "rect-and-concave",
        }
    }

    /// Parse a kind from its [`name`](Self::name), ignoring ASCII case.
    pub fn from_name(name: &str) -> Result<Self, Error> {
        Self::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| Error::UnknownGeometry(name.to_string()))
    }

    /// Selection key, `'1'..='9'`.
    pub fn key(self) -> char {
        let index = Self::ALL.iter().position(|&k| k == self).unwrap_or(0);
        (b'1' + index as u8) as char
    }

    pub fn from_key(key: char) -> Option<Self> {
        let digit = key.to_digit(10)? as usize;
        Self::ALL.get(digit.checked_sub(1)?).copied()
    }

    /// Compound kinds clip to an outer rect before the inner shape.
    pub fn is_compound(self) -> bool {
        self.drawable_kind() != self
    }

    /// The simple kind drawn directly for this kind.
    pub fn drawable_kind(self) -> GeometryKind {
        match self {
            GeometryKind::RectAndRect => GeometryKind::Rect,
            GeometryKind::RectAndRRect => GeometryKind::RRect,
            GeometryKind::RectAndConvex => GeometryKind::ConvexPath,
            GeometryKind::RectAndConcave => GeometryKind::ConcavePath,
            simple => simple,
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GeometryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s)
    }
}

// ============================================================================
// Shape
// ============================================================================

/// A concrete, already offset, shape for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect(RectD),
    RRect(RoundedRect),
    Path(PathStorage),
}

impl Shape {
    /// Analytic inside test. Rect edges are half-open, path fill is non-zero.
    pub fn contains(&self, p: PointD) -> bool {
        match self {
            Shape::Rect(r) => r.contains(p.x, p.y),
            Shape::RRect(rr) => rr.contains(p.x, p.y),
            Shape::Path(path) => path.contains(p.x, p.y),
        }
    }

    pub fn bounds(&self) -> RectD {
        match self {
            Shape::Rect(r) => *r,
            Shape::RRect(rr) => rr.rect(),
            Shape::Path(path) => path
                .bounding_rect()
                .unwrap_or_else(|| RectD::new(0.0, 0.0, 0.0, 0.0)),
        }
    }

    /// Feed the outline into `ras`.
    pub fn rasterize(&self, ras: &mut ScanlineRasterizer) {
        match self {
            Shape::Rect(r) => {
                let mut path = rect_path(r);
                ras.add_path(&mut path, 0);
            }
            Shape::RRect(rr) => {
                let mut rr = *rr;
                ras.add_path(&mut rr, 0);
            }
            Shape::Path(path) => {
                let mut path = path.clone();
                ras.add_path(&mut path, 0);
            }
        }
    }
}

fn rect_path(r: &RectD) -> PathStorage {
    PathStorage::from_polygon(&[
        PointD::new(r.x1, r.y1),
        PointD::new(r.x2, r.y1),
        PointD::new(r.x2, r.y2),
        PointD::new(r.x1, r.y2),
    ])
}

// ============================================================================
// Clip specification
// ============================================================================

/// How a clip step combines with the current clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipOp {
    /// Discard the current clip and use the shape.
    Replace,
    /// Keep only what is inside both.
    Intersect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClipStep {
    pub shape: Shape,
    pub op: ClipOp,
    pub anti_alias: bool,
}

/// Ordered clip steps establishing one clip region.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipSpec {
    steps: Vec<ClipStep>,
}

impl ClipSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, shape: Shape, op: ClipOp, anti_alias: bool) {
        self.steps.push(ClipStep {
            shape,
            op,
            anti_alias,
        });
    }

    pub fn steps(&self) -> &[ClipStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Analytic containment of the combined region. An empty spec clips
    /// nothing.
    pub fn contains(&self, p: PointD) -> bool {
        self.steps.iter().fold(true, |inside, step| match step.op {
            ClipOp::Replace => step.shape.contains(p),
            ClipOp::Intersect => inside && step.shape.contains(p),
        })
    }

    /// Rectangle enclosing the combined region, `None` for an empty spec.
    pub fn bounds(&self) -> Option<RectD> {
        self.steps.iter().fold(None, |acc, step| {
            let b = step.shape.bounds();
            Some(match (step.op, acc) {
                (ClipOp::Intersect, Some(acc)) => intersect_rectangles(&acc, &b),
                _ => b,
            })
        })
    }
}

impl<'a> IntoIterator for &'a ClipSpec {
    type Item = &'a ClipStep;
    type IntoIter = std::slice::Iter<'a, ClipStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

// ============================================================================
// Construction
// ============================================================================

/// The shape drawn directly for `kind` at `offset`.
pub fn build_drawable(kind: GeometryKind, offset: PointD) -> Shape {
    let base = base_rect();
    match kind.drawable_kind() {
        GeometryKind::RRect => Shape::RRect(
            RoundedRect::new(base, RRECT_RADIUS, RRECT_RADIUS).offset(offset.x, offset.y),
        ),
        GeometryKind::Circle => Shape::RRect(RoundedRect::oval(base).offset(offset.x, offset.y)),
        GeometryKind::ConvexPath => {
            Shape::Path(PathStorage::from_polygon(&CONVEX).translated(offset.x, offset.y))
        }
        GeometryKind::ConcavePath => {
            Shape::Path(PathStorage::from_polygon(&CONCAVE).translated(offset.x, offset.y))
        }
        _ => Shape::Rect(base.offset(offset.x, offset.y)),
    }
}

/// Clip steps equivalent to the drawable of `kind` at `offset`.
///
/// Simple kinds replace the clip with the drawable. Compound kinds replace
/// it with the base square shifted by [`COMPOUND_SHIFT`] (always
/// anti-aliased) and then intersect with the drawable.
pub fn build_clip_region(kind: GeometryKind, offset: PointD, anti_alias: bool) -> ClipSpec {
    let mut spec = ClipSpec::new();
    let drawable = build_drawable(kind, offset);
    if kind.is_compound() {
        let outer = base_rect()
            .offset(offset.x, offset.y)
            .offset(COMPOUND_SHIFT.x, COMPOUND_SHIFT.y);
        spec.push(Shape::Rect(outer), ClipOp::Replace, true);
        spec.push(drawable, ClipOp::Intersect, anti_alias);
    } else {
        spec.push(drawable, ClipOp::Replace, anti_alias);
    }
    spec
}

// ============================================================================
// Pixel classification
// ============================================================================

/// Where a pixel lies relative to a region boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelRegion {
    Inside,
    Outside,
    /// Within `margin` of the boundary.
    Boundary,
}

/// Classify pixel `(x, y)` by sampling the square `[x - margin, x + 1 + margin]²`.
///
/// A pixel is `Inside`/`Outside` only if every sample agrees.
pub fn pixel_region(contains: impl Fn(PointD) -> bool, x: i32, y: i32, margin: f64) -> PixelRegion {
    const STEPS: i32 = 4;
    let span = 1.0 + 2.0 * margin;
    let mut inside = 0;
    let mut total = 0;
    for j in 0..=STEPS {
        for i in 0..=STEPS {
            let px = x as f64 - margin + span * i as f64 / STEPS as f64;
            let py = y as f64 - margin + span * j as f64 / STEPS as f64;
            total += 1;
            if contains(PointD::new(px, py)) {
                inside += 1;
            }
        }
    }
    match inside {
        0 => PixelRegion::Outside,
        n if n == total => PixelRegion::Inside,
        _ => PixelRegion::Boundary,
    }
}

// ============================================================================
// Tests
// ============================================================================
