//! # clipmatch
//!
//! Visual regression probe for 2D clipping. Every frame renders one shape
//! twice at the same sub-pixel offset: as a clip region flooded with a marker
//! color and as a direct fill in a reference color. If the rasterizer covers
//! the same pixels both ways, only the color drawn last shows; any marker
//! bleeding through exposes a clip/fill mismatch.
//!
//! ## Architecture
//!
//! Rendering goes through a small scanline pipeline:
//!
//! 1. **Vertex Source**: rectangles, rounded rectangles and polygons
//! 2. **Scanline Rasterizer**: converts outlines to anti-aliased scanlines
//! 3. **Scanline Container**: stores coverage spans between stages
//! 4. **Renderer**: blends spans into RGBA, limited by the clip mask
//!
//! On top of that sit the [`RenderTarget`] abstraction with its
//! save/restore clip stack, the probe itself, and pixel comparison tools.
//!
//! ```
//! use clipmatch::{GeometryMatchProbe, Rgba8};
//!
//! let mut probe = GeometryMatchProbe::new(0.0);
//! probe.handle_key('3');
//! let canvas = probe.snapshot(400, 400, 0.0).unwrap();
//! assert_eq!(canvas.pixel(200, 200), Some(Rgba8::BLACK));
//! ```

// Foundation types
pub mod basics;
pub mod color;
pub mod error;

// Geometry primitives
pub mod path_storage;
pub mod rendering_buffer;
pub mod rounded_rect;

// Scanline rasterizer
pub mod rasterizer_cells_aa;
pub mod rasterizer_scanline_aa;
pub mod scanline_u;

// Pixel formats & renderers
pub mod clip_mask;
pub mod pixfmt_rgba;
pub mod renderer_base;
pub mod renderer_scanline;

// Probe
pub mod animation;
pub mod canvas;
pub mod compare;
pub mod config;
pub mod geometry;
pub mod probe;

pub use animation::{Interpolator, OffsetAnimator, Repeat};
pub use basics::{PointD, RectD, RectI};
pub use canvas::{Canvas, RenderTarget, SaveGuard};
pub use color::Rgba8;
pub use compare::{
    classify_pixel, compare_buffers, generate_diff_image, misclassified_pixels, mismatch_mask,
    CompareResult, PixelBuffer, PixelClass,
};
pub use config::ProbeConfig;
pub use error::{Error, Result};
pub use geometry::{
    build_clip_region, build_drawable, ClipOp, ClipSpec, ClipStep, GeometryKind, PixelRegion, Shape,
};
pub use probe::{
    render_frame, render_frame_with, DrawOrder, GeometryMatchProbe, Palette, ProbeState,
};
