//! Probe configuration loaded from JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::animation::{OffsetAnimator, KEYFRAME_SPACING_MS};
use crate::color::Rgba8;
use crate::error::{Error, Result};
use crate::geometry::GeometryKind;
use crate::probe::{DrawOrder, GeometryMatchProbe, Palette, ProbeState};
use crate::rendering_buffer::MAX_DIMENSION;

/// Surface size, initial probe state and colors.
///
/// Every field is optional in the JSON document:
///
/// ```
/// use clipmatch::ProbeConfig;
///
/// let cfg = ProbeConfig::from_json_str(r#"{ "kind": "circle", "anti_alias": true }"#).unwrap();
/// assert_eq!(cfg.width, 400);
/// assert!(cfg.anti_alias);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub width: u32,
    pub height: u32,
    /// Geometry kind name, e.g. `"rect-and-rrect"`.
    pub kind: String,
    pub clip_first: bool,
    pub anti_alias: bool,
    pub marker: Rgba8,
    pub reference: Rgba8,
    pub background: Rgba8,
    pub keyframe_spacing_ms: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let palette = Palette::default();
        Self {
            width: 400,
            height: 400,
            kind: GeometryKind::Rect.name().to_string(),
            clip_first: true,
            anti_alias: false,
            marker: palette.marker,
            reference: palette.reference,
            background: palette.background,
            keyframe_spacing_ms: KEYFRAME_SPACING_MS,
        }
    }
}

impl ProbeConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and validate a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.width == 0
            || self.height == 0
            || self.width > MAX_DIMENSION
            || self.height > MAX_DIMENSION
        {
            return Err(Error::InvalidSurface {
                width: self.width,
                height: self.height,
            });
        }
        self.geometry_kind()?;
        if !self.keyframe_spacing_ms.is_finite() || self.keyframe_spacing_ms <= 0.0 {
            return Err(Error::InvalidKeyframes(format!(
                "keyframe spacing must be positive, got {}",
                self.keyframe_spacing_ms
            )));
        }
        Ok(())
    }

    pub fn geometry_kind(&self) -> Result<GeometryKind> {
        GeometryKind::from_name(&self.kind)
    }

    pub fn order(&self) -> DrawOrder {
        DrawOrder::from_clip_first(self.clip_first)
    }

    pub fn palette(&self) -> Palette {
        Palette {
            marker: self.marker,
            reference: self.reference,
            background: self.background,
        }
    }

    /// A probe in the configured state, animating from `start_ms`.
    pub fn build_probe(&self, start_ms: f64) -> Result<GeometryMatchProbe> {
        let state = ProbeState::new(self.geometry_kind()?, self.order(), self.anti_alias);
        let animator = OffsetAnimator::with_spacing(start_ms, self.keyframe_spacing_ms);
        Ok(GeometryMatchProbe::with_parts(state, animator, self.palette()))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        assert_eq!(ProbeConfig::from_json_str("{}").unwrap(), ProbeConfig::default());
    }

    #[test]
    fn test_overrides() {
        let cfg = ProbeConfig::from_json_str(
            r#"{
                "width": 64,
                "height": 32,
                "kind": "rect-and-concave",
                "clip_first": false,
                "marker": [0, 255, 0, 255],
                "keyframe_spacing_ms": 250
            }"#,
        )
        .unwrap();
        assert_eq!((cfg.width, cfg.height), (64, 32));
        assert_eq!(cfg.geometry_kind().unwrap(), GeometryKind::RectAndConcave);
        assert_eq!(cfg.order(), DrawOrder::GeometryFirst);
        assert_eq!(cfg.palette().marker, Rgba8::rgba(0, 255, 0, 255));
        assert_eq!(cfg.palette().reference, Rgba8::BLACK);

        let probe = cfg.build_probe(0.0).unwrap();
        assert_eq!(probe.animator().period_ms(), 1000.0);
        assert_eq!(probe.state().kind(), GeometryKind::RectAndConcave);
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(matches!(
            ProbeConfig::from_json_str(r#"{ "width": 0 }"#),
            Err(Error::InvalidSurface { width: 0, .. })
        ));
        assert!(matches!(
            ProbeConfig::from_json_str(r#"{ "kind": "hexagon" }"#),
            Err(Error::UnknownGeometry(_))
        ));
        assert!(matches!(
            ProbeConfig::from_json_str(r#"{ "keyframe_spacing_ms": 0 }"#),
            Err(Error::InvalidKeyframes(_))
        ));
        assert!(matches!(
            ProbeConfig::from_json_str(r#"{ "width": "wide" }"#),
            Err(Error::Json(_))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let cfg = ProbeConfig {
            kind: "circle".into(),
            anti_alias: true,
            ..ProbeConfig::default()
        };
        let text = cfg.to_json_string().unwrap();
        assert!(text.contains("\"marker\": ["));
        assert_eq!(ProbeConfig::from_json_str(&text).unwrap(), cfg);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ProbeConfig::load("/nonexistent/clipmatch.json"),
            Err(Error::Io(_))
        ));
    }
}
