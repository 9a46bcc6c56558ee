//! Piecewise-linear keyframe animation.
//!
//! [`Interpolator`] maps a clock time to N values by interpolating between
//! keyframes, wrapping around the keyframe span while repeats remain.
//! [`OffsetAnimator`] is the probe's diagonal wobble: a unit square traced
//! once every four seconds.

use std::cmp::Ordering;

use crate::basics::PointD;
use crate::error::{Error, Result};

/// How often the keyframe span replays after the first pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repeat {
    Forever,
    /// Total number of passes; `Times(1)` plays once and holds the end.
    Times(u32),
}

#[derive(Debug, Clone, PartialEq)]
struct Keyframe {
    time_ms: f64,
    values: Vec<f64>,
}

/// Linear interpolation over strictly increasing keyframe times.
#[derive(Debug, Clone, PartialEq)]
pub struct Interpolator {
    frames: Vec<Keyframe>,
    repeat: Repeat,
}

impl Interpolator {
    /// Build from `(time_ms, values)` pairs.
    ///
    /// Requires at least two keyframes, strictly increasing times and the
    /// same number of values in every frame.
    pub fn new(keyframes: Vec<(f64, Vec<f64>)>, repeat: Repeat) -> Result<Self> {
        if keyframes.len() < 2 {
            return Err(Error::InvalidKeyframes(format!(
                "need at least two keyframes, got {}",
                keyframes.len()
            )));
        }
        let arity = keyframes[0].1.len();
        if arity == 0 {
            return Err(Error::InvalidKeyframes("keyframes carry no values".into()));
        }
        for (i, pair) in keyframes.windows(2).enumerate() {
            if pair[1].1.len() != arity {
                return Err(Error::InvalidKeyframes(format!(
                    "keyframe {} has {} values, expected {arity}",
                    i + 1,
                    pair[1].1.len()
                )));
            }
            if pair[1].0.partial_cmp(&pair[0].0) != Some(Ordering::Greater) {
                return Err(Error::InvalidKeyframes(format!(
                    "keyframe {} at {}ms does not follow {}ms",
                    i + 1,
                    pair[1].0,
                    pair[0].0
                )));
            }
        }
        let frames = keyframes
            .into_iter()
            .map(|(time_ms, values)| Keyframe { time_ms, values })
            .collect();
        Ok(Self { frames, repeat })
    }

    /// Number of values per keyframe.
    pub fn arity(&self) -> usize {
        self.frames[0].values.len()
    }

    pub fn start_ms(&self) -> f64 {
        self.frames[0].time_ms
    }

    /// Time from the first to the last keyframe.
    pub fn period_ms(&self) -> f64 {
        self.frames[self.frames.len() - 1].time_ms - self.start_ms()
    }

    /// Interpolated values at clock time `t`.
    pub fn values_at(&self, t: f64) -> Vec<f64> {
        let first = &self.frames[0];
        let last = &self.frames[self.frames.len() - 1];
        if t <= first.time_ms {
            return first.values.clone();
        }

        let period = self.period_ms();
        let mut elapsed = t - first.time_ms;
        if elapsed >= period {
            let passes = (elapsed / period).floor();
            if let Repeat::Times(n) = self.repeat {
                if passes >= n as f64 {
                    return last.values.clone();
                }
            }
            elapsed -= passes * period;
        }

        let local = first.time_ms + elapsed;
        let next = self
            .frames
            .iter()
            .position(|f| f.time_ms > local)
            .unwrap_or(self.frames.len() - 1);
        let a = &self.frames[next - 1];
        let b = &self.frames[next];
        let s = (local - a.time_ms) / (b.time_ms - a.time_ms);
        a.values
            .iter()
            .zip(&b.values)
            .map(|(&va, &vb)| va + (vb - va) * s)
            .collect()
    }
}

// ============================================================================
// OffsetAnimator
// ============================================================================

/// Default time between wobble keyframes.
pub const KEYFRAME_SPACING_MS: f64 = 1000.0;

const WOBBLE: [[f64; 2]; 5] = [[0.0, 0.0], [0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

/// Sub-pixel offset cycling `(0,0) → (0,1) → (1,1) → (1,0) → (0,0)`.
///
/// The first keyframe sits one spacing after `start_ms`, so the offset
/// holds at zero for the first second.
#[derive(Debug, Clone, PartialEq)]
pub struct OffsetAnimator {
    interp: Interpolator,
}

impl OffsetAnimator {
    pub fn new(start_ms: f64) -> Self {
        Self::with_spacing(start_ms, KEYFRAME_SPACING_MS)
    }

    /// Keyframes `spacing_ms` apart. Non-positive spacings fall back to the
    /// default.
    pub fn with_spacing(start_ms: f64, spacing_ms: f64) -> Self {
        let spacing = if spacing_ms > 0.0 {
            spacing_ms
        } else {
            KEYFRAME_SPACING_MS
        };
        let frames = WOBBLE
            .iter()
            .enumerate()
            .map(|(i, v)| Keyframe {
                time_ms: start_ms + spacing * (i + 1) as f64,
                values: v.to_vec(),
            })
            .collect();
        Self {
            interp: Interpolator {
                frames,
                repeat: Repeat::Forever,
            },
        }
    }

    pub fn period_ms(&self) -> f64 {
        self.interp.period_ms()
    }

    pub fn start_ms(&self) -> f64 {
        self.interp.start_ms()
    }

    pub fn offset_at(&self, t: f64) -> PointD {
        let v = self.interp.values_at(t);
        PointD::new(v[0], v[1])
    }
}

impl Default for OffsetAnimator {
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
    use approx::assert_relative_eq;

    fn ramp(repeat: Repeat) -> Interpolator {
        Interpolator::new(vec![(0.0, vec![0.0]), (10.0, vec![10.0])], repeat).unwrap()
    }

    #[test]
    fn test_rejects_bad_keyframes() {
        assert!(matches!(
            Interpolator::new(vec![(0.0, vec![1.0])], Repeat::Forever),
            Err(Error::InvalidKeyframes(_))
        ));
        assert!(Interpolator::new(
            vec![(0.0, vec![1.0]), (0.0, vec![2.0])],
            Repeat::Forever
        )
        .is_err());
        assert!(Interpolator::new(
            vec![(0.0, vec![1.0]), (5.0, vec![2.0, 3.0])],
            Repeat::Forever
        )
        .is_err());
        assert!(Interpolator::new(vec![(0.0, vec![]), (5.0, vec![])], Repeat::Forever).is_err());
    }

    #[test]
    fn test_before_first_holds_first() {
        let r = ramp(Repeat::Forever);
        assert_eq!(r.values_at(-50.0), vec![0.0]);
    }

    #[test]
    fn test_linear_within_span() {
        let r = ramp(Repeat::Forever);
        assert_relative_eq!(r.values_at(2.5)[0], 2.5);
        assert_relative_eq!(r.values_at(9.0)[0], 9.0);
    }

    #[test]
    fn test_wraps_forever() {
        let r = ramp(Repeat::Forever);
        assert_relative_eq!(r.values_at(12.5)[0], 2.5);
        assert_relative_eq!(r.values_at(1003.0)[0], 3.0);
    }

    #[test]
    fn test_times_holds_last_after_repeats() {
        let r = ramp(Repeat::Times(2));
        assert_relative_eq!(r.values_at(15.0)[0], 5.0);
        assert_eq!(r.values_at(20.0), vec![10.0]);
        assert_eq!(r.values_at(500.0), vec![10.0]);
    }

    #[test]
    fn test_offset_keyframes() {
        let anim = OffsetAnimator::new(0.0);
        assert_eq!(anim.period_ms(), 4000.0);
        assert_eq!(anim.offset_at(0.0), PointD::ZERO);
        assert_eq!(anim.offset_at(1000.0), PointD::new(0.0, 0.0));
        assert_eq!(anim.offset_at(2000.0), PointD::new(0.0, 1.0));
        assert_eq!(anim.offset_at(3000.0), PointD::new(1.0, 1.0));
        assert_eq!(anim.offset_at(4000.0), PointD::new(1.0, 0.0));
        assert_eq!(anim.offset_at(5000.0), PointD::new(0.0, 0.0));
    }

    #[test]
    fn test_offset_midpoints() {
        let anim = OffsetAnimator::new(250.0);
        let p = anim.offset_at(250.0 + 1500.0);
        assert_relative_eq!(p.x, 0.0);
        assert_relative_eq!(p.y, 0.5);
        let p = anim.offset_at(250.0 + 3500.0);
        assert_relative_eq!(p.x, 1.0);
        assert_relative_eq!(p.y, 0.5);
    }

    #[test]
    fn test_offset_periodic() {
        let anim = OffsetAnimator::new(0.0);
        for t in [1234.0, 2500.0, 3999.0, 4711.0] {
            let a = anim.offset_at(t);
            let b = anim.offset_at(t + anim.period_ms() * 3.0);
            assert_relative_eq!(a.x, b.x, epsilon = 1e-9);
            assert_relative_eq!(a.y, b.y, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_custom_spacing() {
        let anim = OffsetAnimator::with_spacing(0.0, 250.0);
        assert_eq!(anim.period_ms(), 1000.0);
        assert_eq!(anim.offset_at(500.0), PointD::new(0.0, 1.0));
        assert_eq!(OffsetAnimator::with_spacing(0.0, -1.0).period_ms(), 4000.0);
    }
}
