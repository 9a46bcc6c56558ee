use wasm_bindgen::prelude::*;

use clipmatch::{Canvas, GeometryKind, GeometryMatchProbe, OffsetAnimator};

/// Interactive probe bound to one canvas.
///
/// The TypeScript frontend forwards key presses to [`key`](Self::key) and,
/// whenever it returns `true` or an animation frame fires, copies the
/// result of [`render`](Self::render) into an ImageData.
#[wasm_bindgen]
pub struct ProbeSession {
    probe: GeometryMatchProbe,
    canvas: Canvas,
}

#[wasm_bindgen]
impl ProbeSession {
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32) -> Result<ProbeSession, JsError> {
        Ok(Self {
            probe: GeometryMatchProbe::default(),
            canvas: Canvas::new(width, height)?,
        })
    }

    /// Restart the offset animation at clock time `start_ms`.
    pub fn restart(&mut self, start_ms: f64) {
        self.probe = GeometryMatchProbe::with_parts(
            *self.probe.state(),
            OffsetAnimator::new(start_ms),
            *self.probe.palette(),
        );
    }

    /// Returns whether the key changed the probe and a redraw is needed.
    pub fn key(&mut self, key: char) -> bool {
        self.probe.handle_key(key)
    }

    /// RGBA pixels (width * height * 4 bytes) of the frame at `time_ms`.
    pub fn render(&mut self, time_ms: f64) -> Vec<u8> {
        self.canvas.clear(self.probe.palette().background);
        self.probe.draw(&mut self.canvas, time_ms);
        self.canvas.as_bytes().to_vec()
    }

    pub fn kind_name(&self) -> String {
        self.probe.state().kind().name().to_string()
    }

    pub fn clip_first(&self) -> bool {
        self.probe.state().order().is_clip_first()
    }

    pub fn anti_alias(&self) -> bool {
        self.probe.state().anti_alias()
    }

    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    pub fn height(&self) -> u32 {
        self.canvas.height()
    }
}

/// Current wall clock in milliseconds.
#[wasm_bindgen]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}

/// Get the library version string.
#[wasm_bindgen]
pub fn version() -> String {
    format!("clipmatch {}", env!("CARGO_PKG_VERSION"))
}

/// Comma-separated geometry kind names in key order.
#[wasm_bindgen]
pub fn kind_names() -> String {
    GeometryKind::ALL.map(|k| k.name()).join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_keys() {
        let mut s = ProbeSession::new(64, 48).unwrap();
        assert_eq!(s.kind_name(), "rect");
        assert!(s.clip_first());
        assert!(s.key('7'));
        assert_eq!(s.kind_name(), "rect-and-rrect");
        assert!(s.key('t'));
        assert!(!s.clip_first());
        assert!(!s.key('q'));
    }

    #[test]
    fn test_render_size() {
        let mut s = ProbeSession::new(400, 300).unwrap();
        let px = s.render(0.0);
        assert_eq!(px.len(), 400 * 300 * 4);
        let i = (200 * 400 + 200) * 4;
        assert_eq!(&px[i..i + 4], &[0, 0, 0, 255]);
        assert_eq!(&px[..4], &[255, 255, 255, 255]);
    }

    #[test]
    fn test_restart_keeps_state() {
        let mut s = ProbeSession::new(32, 32).unwrap();
        s.key('a');
        s.restart(5000.0);
        assert!(s.anti_alias());
        assert_eq!(s.probe.offset_at(7000.0), clipmatch::PointD::new(0.0, 1.0));
    }

    #[test]
    fn test_kind_names() {
        assert!(kind_names().starts_with("rect,rrect,circle,"));
        assert_eq!(kind_names().split(',').count(), 9);
    }
}
