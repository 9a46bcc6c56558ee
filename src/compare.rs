//! Pixel buffer comparison.
//!
//! Provides byte-level comparison of two RGBA buffers, diff image
//! generation, and probe-specific pixel classification.

use std::fmt;

use crate::basics::{PointD, RectD};
use crate::canvas::Canvas;
use crate::color::Rgba8;
use crate::error::{Error, Result};
use crate::geometry::{
    build_clip_region, build_drawable, pixel_region, ClipOp, ClipSpec, GeometryKind, PixelRegion,
    Shape,
};
use crate::probe::{DrawOrder, Palette};
use crate::rendering_buffer::{RenderingBuffer, BPP};

// ============================================================================
// Pixel Buffer
// ============================================================================

/// An RGBA pixel buffer with dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, row-major, top-to-bottom. Length = width * height * 4.
    pub data: Vec<u8>,
}

impl PixelBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * BPP],
        }
    }

    /// Wrap existing RGBA bytes. Fails when the length does not match.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if data.len() != width as usize * height as usize * BPP {
            return Err(Error::InvalidSurface { width, height });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    fn index(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BPP
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = self.index(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, p: [u8; 4]) {
        let i = self.index(x, y);
        self.data[i..i + BPP].copy_from_slice(&p);
    }

    fn check_same_size(&self, other: &PixelBuffer) -> Result<()> {
        if self.width != other.width || self.height != other.height {
            return Err(Error::BufferMismatch {
                left_width: self.width,
                left_height: self.height,
                right_width: other.width,
                right_height: other.height,
            });
        }
        Ok(())
    }
}

impl From<RenderingBuffer> for PixelBuffer {
    fn from(buf: RenderingBuffer) -> Self {
        let (width, height) = (buf.width(), buf.height());
        Self {
            width,
            height,
            data: buf.into_vec(),
        }
    }
}

impl From<&Canvas> for PixelBuffer {
    fn from(canvas: &Canvas) -> Self {
        Self {
            width: canvas.width(),
            height: canvas.height(),
            data: canvas.as_bytes().to_vec(),
        }
    }
}

// ============================================================================
// Comparison Result
// ============================================================================

/// Information about a single pixel difference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffInfo {
    pub x: u32,
    pub y: u32,
    pub pixel_a: [u8; 4],
    pub pixel_b: [u8; 4],
}

/// Result of comparing two pixel buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct CompareResult {
    /// True if every pixel in both buffers is identical.
    pub identical: bool,
    pub total_pixels: u64,
    /// Number of pixels that differ by at least 1 in any channel.
    pub different_pixels: u64,
    /// Maximum absolute difference across any single channel of any pixel.
    pub max_channel_diff: u8,
    /// Mean absolute difference over all differing channels.
    pub mean_channel_diff: f64,
    /// The first differing pixel found (scanning left-to-right, top-to-bottom).
    pub first_diff: Option<DiffInfo>,
}

impl fmt::Display for CompareResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.identical {
            return write!(f, "IDENTICAL: {} pixels match perfectly", self.total_pixels);
        }
        write!(
            f,
            "DIFFERENT: {}/{} pixels differ ({:.2}%), max_diff={}, mean_diff={:.4}",
            self.different_pixels,
            self.total_pixels,
            self.different_pixels as f64 / self.total_pixels as f64 * 100.0,
            self.max_channel_diff,
            self.mean_channel_diff,
        )?;
        if let Some(ref d) = self.first_diff {
            write!(
                f,
                "\n  First diff at ({}, {}): A={:?} B={:?}",
                d.x, d.y, d.pixel_a, d.pixel_b
            )?;
        }
        Ok(())
    }
}

// ============================================================================
// Buffer Comparison
// ============================================================================

/// Compare two RGBA pixel buffers channel by channel.
pub fn compare_buffers(a: &PixelBuffer, b: &PixelBuffer) -> Result<CompareResult> {
    a.check_same_size(b)?;

    let mut different_pixels = 0u64;
    let mut max_channel_diff = 0u8;
    let mut diff_sum = 0u64;
    let mut diff_channels = 0u64;
    let mut first_diff = None;

    for y in 0..a.height {
        for x in 0..a.width {
            let pa = a.pixel(x, y);
            let pb = b.pixel(x, y);
            let mut differs = false;
            for (&ca, &cb) in pa.iter().zip(&pb) {
                let diff = ca.abs_diff(cb);
                if diff > 0 {
                    differs = true;
                    max_channel_diff = max_channel_diff.max(diff);
                    diff_sum += diff as u64;
                    diff_channels += 1;
                }
            }
            if differs {
                different_pixels += 1;
                first_diff.get_or_insert(DiffInfo {
                    x,
                    y,
                    pixel_a: pa,
                    pixel_b: pb,
                });
            }
        }
    }

    Ok(CompareResult {
        identical: different_pixels == 0,
        total_pixels: a.width as u64 * a.height as u64,
        different_pixels,
        max_channel_diff,
        mean_channel_diff: if diff_channels > 0 {
            diff_sum as f64 / diff_channels as f64
        } else {
            0.0
        },
        first_diff,
    })
}

/// Visual diff: identical pixels dark gray, differing pixels red with
/// brightness proportional to the color difference (amplified 10x).
pub fn generate_diff_image(a: &PixelBuffer, b: &PixelBuffer) -> Result<PixelBuffer> {
    a.check_same_size(b)?;

    let mut diff = PixelBuffer::new(a.width, a.height);
    for y in 0..a.height {
        for x in 0..a.width {
            let (pa, pb) = (a.pixel(x, y), b.pixel(x, y));
            let max_diff = (0..3).map(|c| pa[c].abs_diff(pb[c])).max().unwrap_or(0);
            let out = if max_diff == 0 {
                [40, 40, 40, 255]
            } else {
                [(max_diff as u16 * 10).min(255) as u8, 0, 0, 255]
            };
            diff.set_pixel(x, y, out);
        }
    }
    Ok(diff)
}

// ============================================================================
// Probe classification
// ============================================================================

/// What a probe frame shows at a pixel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelClass {
    Marker,
    Reference,
    Background,
    /// Anything else, typically a partially covered edge.
    Mixed,
}

pub fn classify_pixel(rgba: [u8; 4], palette: &Palette) -> PixelClass {
    let c = Rgba8::from(rgba);
    if c == palette.marker {
        PixelClass::Marker
    } else if c == palette.reference {
        PixelClass::Reference
    } else if c == palette.background {
        PixelClass::Background
    } else {
        PixelClass::Mixed
    }
}

/// Pixels of a probe frame where the color drawn first shows through.
///
/// A clip-first frame should show only the reference color and the
/// background; any marker or blended pixel is one the clip covered more
/// than the fill did. A geometry-first frame is the mirror image.
///
/// Only pixels the clip region `clip` can reach are considered: the last
/// clip step must not be outside the pixel, and every step it intersects
/// with must be inside it, both with a one pixel margin. There the clip
/// coverage is the drawable's own, so for matching geometry both orders
/// flag the same positions, in scan order.
pub fn mismatch_mask(
    frame: &PixelBuffer,
    order: DrawOrder,
    clip: &ClipSpec,
    palette: &Palette,
) -> Vec<(u32, u32)> {
    let last = match order {
        DrawOrder::ClipFirst => PixelClass::Reference,
        DrawOrder::GeometryFirst => PixelClass::Marker,
    };
    let steps = clip.steps();
    let replaced = steps
        .iter()
        .rposition(|step| step.op == ClipOp::Replace)
        .unwrap_or(0);
    let regions: Vec<(&Shape, Option<RectD>)> = steps[replaced..]
        .iter()
        .map(|step| (&step.shape, Some(step.shape.bounds())))
        .collect();
    let reachable = |x: i32, y: i32| match regions.split_last() {
        None => true,
        Some(((edge, edge_bounds), enclosing)) => {
            region_near(|p| edge.contains(p), *edge_bounds, x, y) != PixelRegion::Outside
                && enclosing.iter().all(|(shape, bounds)| {
                    region_near(|p| shape.contains(p), *bounds, x, y) == PixelRegion::Inside
                })
        }
    };

    let mut out = Vec::new();
    for y in 0..frame.height {
        for x in 0..frame.width {
            if !reachable(x as i32, y as i32) {
                continue;
            }
            let class = classify_pixel(frame.pixel(x, y), palette);
            if class != last && class != PixelClass::Background {
                out.push((x, y));
            }
        }
    }
    out
}

/// Pixels of a probe frame that show the wrong class away from any edge.
///
/// Each pixel is classified against the analytic clip region and drawable
/// of `(kind, offset)` with a one pixel margin; pixels near a boundary are
/// skipped. A clip-first frame must show the reference color inside the
/// drawable, the marker inside the remaining clip, and the background
/// elsewhere. A geometry-first frame gives the marker precedence.
pub fn misclassified_pixels(
    frame: &PixelBuffer,
    kind: GeometryKind,
    offset: PointD,
    order: DrawOrder,
    palette: &Palette,
) -> Vec<(u32, u32)> {
    let clip = build_clip_region(kind, offset, false);
    let drawable = build_drawable(kind, offset);
    let clip_bounds = clip.bounds();
    let drawable_bounds = Some(drawable.bounds());

    let mut out = Vec::new();
    for y in 0..frame.height {
        for x in 0..frame.width {
            let (px, py) = (x as i32, y as i32);
            let in_clip = region_near(|p| clip.contains(p), clip_bounds, px, py);
            let in_drawable = region_near(|p| drawable.contains(p), drawable_bounds, px, py);
            let (first, second, top, bottom) = match order {
                DrawOrder::ClipFirst => {
                    (in_drawable, in_clip, PixelClass::Reference, PixelClass::Marker)
                }
                DrawOrder::GeometryFirst => {
                    (in_clip, in_drawable, PixelClass::Marker, PixelClass::Reference)
                }
            };
            let expected = match (first, second) {
                (PixelRegion::Inside, _) => top,
                (PixelRegion::Outside, PixelRegion::Inside) => bottom,
                (PixelRegion::Outside, PixelRegion::Outside) => PixelClass::Background,
                _ => continue,
            };
            if classify_pixel(frame.pixel(x, y), palette) != expected {
                out.push((x, y));
            }
        }
    }
    out
}

/// [`pixel_region`] with a bounding box shortcut.
fn region_near(
    contains: impl Fn(PointD) -> bool,
    bounds: Option<RectD>,
    x: i32,
    y: i32,
) -> PixelRegion {
    const MARGIN: f64 = 1.0;
    let Some(b) = bounds else {
        return PixelRegion::Outside;
    };
    let (fx, fy) = (x as f64, y as f64);
    if fx + 1.0 + MARGIN < b.x1
        || fx - MARGIN > b.x2
        || fy + 1.0 + MARGIN < b.y1
        || fy - MARGIN > b.y2
    {
        return PixelRegion::Outside;
    }
    pixel_region(contains, x, y, MARGIN)
}

// ============================================================================
// Tests
// ============================================================================
