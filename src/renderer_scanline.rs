//! Scanline rendering driver.
//!
//! Ties the pipeline together: rasterizer → scanline → renderer.

use crate::pixfmt_rgba::PixelFormat;
use crate::rasterizer_scanline_aa::{Scanline, ScanlineRasterizer};
use crate::renderer_base::RendererBase;
use crate::scanline_u::ScanlineU8;

/// Fill everything in `ras` with a solid color.
pub fn render_scanlines_aa_solid<PF: PixelFormat>(
    ras: &mut ScanlineRasterizer,
    sl: &mut ScanlineU8,
    ren: &mut RendererBase<'_, PF>,
    color: &PF::ColorType,
) {
    if !ras.rewind_scanlines() {
        return;
    }
    sl.reset(ras.min_x(), ras.max_x());
    while ras.sweep_scanline(sl) {
        render_scanline_aa_solid(sl, ren, color);
    }
}

fn render_scanline_aa_solid<PF: PixelFormat>(
    sl: &ScanlineU8,
    ren: &mut RendererBase<'_, PF>,
    color: &PF::ColorType,
) {
    let y = sl.y();
    for span in sl.spans() {
        ren.blend_solid_hspan(span.x, y, span.len as i32, color, sl.span_covers(span));
    }
}

// ============================================================================
// Tests
// ============================================================================
