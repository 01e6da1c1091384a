// extensions/easing.rs
//
// Easing curves for cinematic keyframe transitions.
// f64 throughout: they scale spans of simulated days, not pixels.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Easing function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant velocity.
    Linear,
    /// Slow start and end.
    QuadInOut,
    /// Stronger slow start and end.
    CubicInOut,
    /// Smooth sine ramp. Default for camera moves.
    #[default]
    SineInOut,
    /// Slow end.
    QuadOut,
}

impl Easing {
    /// Apply the easing function to a normalized time value `t` in [0, 1].
    /// Output stays in [0, 1] and is non-decreasing in `t`.
    #[inline]
    pub fn apply(self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::QuadInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
            Easing::QuadOut => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

/// Linearly interpolate between two values.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Interpolate with easing.
#[inline]
pub fn ease(a: f64, b: f64, t: f64, easing: Easing) -> f64 {
    lerp(a, b, easing.apply(t))
}

/// Interpolate an angle in degrees along the shorter arc.
#[inline]
pub fn ease_angle_deg(a: f64, b: f64, t: f64, easing: Easing) -> f64 {
    let delta = (b - a + 180.0).rem_euclid(360.0) - 180.0;
    a + delta * easing.apply(t)
}
