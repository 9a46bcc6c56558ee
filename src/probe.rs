//! The geometry-match probe.
//!
//! Each frame draws one shape twice at the same sub-pixel offset: once as a
//! clip region flooded with the marker color, once as a plain fill in the
//! reference color. Wherever clipping and filling agree on coverage only the
//! color drawn last is visible, so any marker pixel showing through a
//! reference fill (or the other way round) exposes a rasterization mismatch.

use std::fmt;

use tracing::{debug, trace};

use crate::animation::OffsetAnimator;
use crate::basics::{PointD, RectD};
use crate::canvas::{Canvas, RenderTarget, SaveGuard};
use crate::color::Rgba8;
use crate::error::Result;
use crate::geometry::{build_clip_region, build_drawable, GeometryKind};

/// Which pass is drawn first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DrawOrder {
    /// Clipped marker flood, then the reference fill on top.
    #[default]
    ClipFirst,
    /// Reference fill, then the clipped marker flood on top.
    GeometryFirst,
}

impl DrawOrder {
    pub fn toggled(self) -> Self {
        match self {
            DrawOrder::ClipFirst => DrawOrder::GeometryFirst,
            DrawOrder::GeometryFirst => DrawOrder::ClipFirst,
        }
    }

    pub fn is_clip_first(self) -> bool {
        self == DrawOrder::ClipFirst
    }

    pub fn from_clip_first(clip_first: bool) -> Self {
        if clip_first {
            DrawOrder::ClipFirst
        } else {
            DrawOrder::GeometryFirst
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DrawOrder::ClipFirst => "clip-first",
            DrawOrder::GeometryFirst => "geometry-first",
        }
    }
}

impl fmt::Display for DrawOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Colors used by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Flood color of the clipped pass.
    pub marker: Rgba8,
    /// Fill color of the direct pass.
    pub reference: Rgba8,
    /// Color the surface is cleared to before drawing.
    pub background: Rgba8,
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            marker: Rgba8::RED,
            reference: Rgba8::BLACK,
            background: Rgba8::WHITE,
        }
    }
}

// ============================================================================
// ProbeState
// ============================================================================

/// User-selectable probe settings.
///
/// Every command returns `true` to request a redraw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProbeState {
    kind: GeometryKind,
    order: DrawOrder,
    anti_alias: bool,
}

impl ProbeState {
    pub fn new(kind: GeometryKind, order: DrawOrder, anti_alias: bool) -> Self {
        Self {
            kind,
            order,
            anti_alias,
        }
    }

    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    pub fn order(&self) -> DrawOrder {
        self.order
    }

    pub fn anti_alias(&self) -> bool {
        self.anti_alias
    }

    pub fn select_geometry(&mut self, kind: GeometryKind) -> bool {
        debug!(from = %self.kind, to = %kind, "select geometry");
        self.kind = kind;
        true
    }

    pub fn toggle_order(&mut self) -> bool {
        self.order = self.order.toggled();
        debug!(order = %self.order, "toggle draw order");
        true
    }

    pub fn set_anti_alias(&mut self, anti_alias: bool) -> bool {
        debug!(anti_alias, "set anti-alias");
        self.anti_alias = anti_alias;
        true
    }

    pub fn toggle_anti_alias(&mut self) -> bool {
        self.set_anti_alias(!self.anti_alias)
    }

    /// Keys `1`-`9` select a geometry kind, `t` toggles the draw order and
    /// `a` toggles anti-aliasing. Returns whether the key was consumed.
    pub fn handle_key(&mut self, key: char) -> bool {
        if let Some(kind) = GeometryKind::from_key(key) {
            return self.select_geometry(kind);
        }
        match key {
            't' => self.toggle_order(),
            'a' => self.toggle_anti_alias(),
            _ => false,
        }
    }
}

// ============================================================================
// Frame rendering
// ============================================================================

/// Draw one probe frame with the default palette.
pub fn render_frame<T: RenderTarget + ?Sized>(
    target: &mut T,
    kind: GeometryKind,
    offset: PointD,
    order: DrawOrder,
    anti_alias: bool,
) {
    render_frame_with(target, kind, offset, order, anti_alias, &Palette::default());
}

/// Draw one probe frame: the clipped marker pass and the direct reference
/// pass, in `order`. The target's clip state is unchanged on return.
pub fn render_frame_with<T: RenderTarget + ?Sized>(
    target: &mut T,
    kind: GeometryKind,
    offset: PointD,
    order: DrawOrder,
    anti_alias: bool,
    palette: &Palette,
) {
    trace!(%kind, x = offset.x, y = offset.y, %order, anti_alias, "frame");
    let mut frame = SaveGuard::new(target);
    match order {
        DrawOrder::ClipFirst => {
            clipped_pass(&mut *frame, kind, offset, anti_alias, palette.marker);
            direct_pass(&mut *frame, kind, offset, anti_alias, palette.reference);
        }
        DrawOrder::GeometryFirst => {
            direct_pass(&mut *frame, kind, offset, anti_alias, palette.reference);
            clipped_pass(&mut *frame, kind, offset, anti_alias, palette.marker);
        }
    }
}

fn clipped_pass<T: RenderTarget + ?Sized>(
    target: &mut T,
    kind: GeometryKind,
    offset: PointD,
    anti_alias: bool,
    color: Rgba8,
) {
    trace!("clipped pass");
    let (width, height) = target.device_size();
    let mut scope = SaveGuard::new(target);
    scope.clip_spec(&build_clip_region(kind, offset, anti_alias));
    scope.fill_rect(RectD::from_size(width as f64, height as f64), color);
}

fn direct_pass<T: RenderTarget + ?Sized>(
    target: &mut T,
    kind: GeometryKind,
    offset: PointD,
    anti_alias: bool,
    color: Rgba8,
) {
    trace!("direct pass");
    target.fill_shape(&build_drawable(kind, offset), color, anti_alias);
}

// ============================================================================
// GeometryMatchProbe
// ============================================================================

/// Probe state plus its animation clock.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryMatchProbe {
    state: ProbeState,
    animator: OffsetAnimator,
    palette: Palette,
}

impl GeometryMatchProbe {
    /// A probe whose animation starts at `start_ms`.
    pub fn new(start_ms: f64) -> Self {
        Self::with_parts(ProbeState::default(), OffsetAnimator::new(start_ms), Palette::default())
    }

    pub fn with_parts(state: ProbeState, animator: OffsetAnimator, palette: Palette) -> Self {
        Self {
            state,
            animator,
            palette,
        }
    }

    pub fn state(&self) -> &ProbeState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ProbeState {
        &mut self.state
    }

    pub fn animator(&self) -> &OffsetAnimator {
        &self.animator
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn handle_key(&mut self, key: char) -> bool {
        self.state.handle_key(key)
    }

    pub fn offset_at(&self, time_ms: f64) -> PointD {
        self.animator.offset_at(time_ms)
    }

    /// Draw the frame for clock time `time_ms` with the current state.
    pub fn draw<T: RenderTarget + ?Sized>(&self, target: &mut T, time_ms: f64) {
        let s = self.state;
        render_frame_with(
            target,
            s.kind,
            self.offset_at(time_ms),
            s.order,
            s.anti_alias,
            &self.palette,
        );
    }

    /// Render the frame at `time_ms` onto a fresh canvas cleared to the
    /// background color.
    pub fn snapshot(&self, width: u32, height: u32, time_ms: f64) -> Result<Canvas> {
        let mut canvas = Canvas::new(width, height)?;
        canvas.clear(self.palette.background);
        self.draw(&mut canvas, time_ms);
        Ok(canvas)
    }
}

impl Default for GeometryMatchProbe {
    fn default() -> Self {
        Self::new(0.0)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{ClipOp, Shape};

    /// Records calls instead of drawing.
    #[derive(Default)]
    struct Recorder {
        depth: usize,
        log: Vec<String>,
    }

    impl RenderTarget for Recorder {
        fn device_size(&self) -> (u32, u32) {
            (400, 400)
        }

        fn save(&mut self) -> usize {
            self.depth += 1;
            self.log.push("save".into());
            self.depth
        }

        fn restore(&mut self) {
            if self.depth > 0 {
                self.depth -= 1;
                self.log.push("restore".into());
            }
        }

        fn save_count(&self) -> usize {
            self.depth + 1
        }

        fn clip_shape(&mut self, _shape: &Shape, op: ClipOp, anti_alias: bool) {
            self.log.push(format!("clip {op:?} aa={anti_alias}"));
        }

        fn fill_shape(&mut self, shape: &Shape, color: Rgba8, _anti_alias: bool) {
            let what = if color == Rgba8::RED { "marker" } else { "reference" };
            let full = shape.bounds() == RectD::from_size(400.0, 400.0);
            self.log.push(format!("fill {what} full={full}"));
        }
    }

    #[test]
    fn test_handle_key() {
        let mut s = ProbeState::default();
        assert_eq!(s.kind(), GeometryKind::Rect);
        assert!(!s.anti_alias());
        assert!(s.handle_key('5'));
        assert_eq!(s.kind(), GeometryKind::ConcavePath);
        assert!(s.handle_key('9'));
        assert_eq!(s.kind(), GeometryKind::RectAndConcave);
        assert!(s.handle_key('t'));
        assert_eq!(s.order(), DrawOrder::GeometryFirst);
        assert!(s.handle_key('a'));
        assert!(s.anti_alias());
        assert!(!s.handle_key('0'));
        assert!(!s.handle_key('x'));
        assert_eq!(s.kind(), GeometryKind::RectAndConcave);
    }

    #[test]
    fn test_commands_idempotent() {
        let mut s = ProbeState::default();
        s.select_geometry(GeometryKind::Circle);
        let once = s;
        s.select_geometry(GeometryKind::Circle);
        assert_eq!(s, once);
        s.set_anti_alias(true);
        s.set_anti_alias(true);
        assert!(s.anti_alias());
        s.toggle_order();
        s.toggle_order();
        assert_eq!(s.order(), DrawOrder::ClipFirst);
    }

    #[test]
    fn test_clip_first_call_sequence() {
        let mut r = Recorder::default();
        render_frame(&mut r, GeometryKind::RRect, PointD::ZERO, DrawOrder::ClipFirst, false);
        assert_eq!(
            r.log,
            [
                "save",
                "save",
                "clip Replace aa=false",
                "fill marker full=true",
                "restore",
                "fill reference full=false",
                "restore",
            ]
        );
        assert_eq!(r.save_count(), 1);
    }

    #[test]
    fn test_geometry_first_compound_sequence() {
        let mut r = Recorder::default();
        render_frame(
            &mut r,
            GeometryKind::RectAndConvex,
            PointD::new(0.5, 0.5),
            DrawOrder::GeometryFirst,
            false,
        );
        assert_eq!(
            r.log,
            [
                "save",
                "fill reference full=false",
                "save",
                "clip Replace aa=true",
                "clip Intersect aa=false",
                "fill marker full=true",
                "restore",
                "restore",
            ]
        );
    }

    #[test]
    fn test_rect_frame_pixels() {
        let probe = GeometryMatchProbe::default();
        let canvas = probe.snapshot(400, 400, 0.0).unwrap();
        assert_eq!(canvas.pixel(200, 200), Some(Rgba8::BLACK));
        assert_eq!(canvas.pixel(150, 250), Some(Rgba8::BLACK));
        assert_eq!(canvas.pixel(50, 50), Some(Rgba8::WHITE));
        assert_eq!(canvas.pixel(350, 200), Some(Rgba8::WHITE));
        assert!(canvas.clip_mask().is_none());
        assert_eq!(canvas.save_count(), 1);
    }

    #[test]
    fn test_geometry_first_shows_marker() {
        let mut probe = GeometryMatchProbe::default();
        probe.handle_key('t');
        let canvas = probe.snapshot(400, 400, 0.0).unwrap();
        assert_eq!(canvas.pixel(200, 200), Some(Rgba8::RED));
        assert_eq!(canvas.pixel(10, 10), Some(Rgba8::WHITE));
    }

    #[test]
    fn test_draw_uses_animated_offset() {
        let probe = GeometryMatchProbe::default();
        assert_eq!(probe.offset_at(3000.0), PointD::new(1.0, 1.0));
        let canvas = probe.snapshot(400, 400, 3000.0).unwrap();
        // Base square spans [100.5, 299.5); shifted by (1, 1) its left edge
        // sits at 101.5, so column 100 is background.
        assert_eq!(canvas.pixel(100, 200), Some(Rgba8::WHITE));
        assert_eq!(canvas.pixel(300, 200), Some(Rgba8::BLACK));
    }

    #[test]
    fn test_draw_order_names() {
        assert_eq!(DrawOrder::ClipFirst.to_string(), "clip-first");
        assert_eq!(DrawOrder::from_clip_first(false), DrawOrder::GeometryFirst);
        assert!(DrawOrder::GeometryFirst.toggled().is_clip_first());
    }
}
