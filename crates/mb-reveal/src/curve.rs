//! Easing Curves
//!
//! Maps shaped spin progress to the fraction of travel covered.

use serde::{Deserialize, Serialize};

/// Overshoot coefficient of the default reveal curve
pub const DEFAULT_OVERSHOOT: f64 = 0.38;

/// Ease curve for strip travel
///
/// Every variant returns exactly 0.0 at `t <= 0` and exactly 1.0 at `t >= 1`,
/// so the last frame of a spin always lands on the target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EaseCurve {
    /// Constant rate
    Linear,
    /// Cubic ease-out: fast start, soft stop
    OutCubic,
    /// Cubic-plus-quadratic ease-out that runs slightly past the target and
    /// pulls back
    OutBack { overshoot: f64 },
}

impl Default for EaseCurve {
    fn default() -> Self {
        EaseCurve::OutBack {
            overshoot: DEFAULT_OVERSHOOT,
        }
    }
}

impl EaseCurve {
    /// Evaluate curve at position t (0.0 - 1.0)
    #[inline]
    pub fn evaluate(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }

        let u = t - 1.0;
        match *self {
            EaseCurve::Linear => t,
            // y = 1 + (t-1)^3
            EaseCurve::OutCubic => 1.0 + u * u * u,
            // y = 1 + (c+1)(t-1)^3 + c(t-1)^2
            EaseCurve::OutBack { overshoot } => {
                1.0 + (overshoot + 1.0) * u * u * u + overshoot * u * u
            }
        }
    }

    /// First derivative at t (clamped to 0.0 - 1.0)
    #[inline]
    pub fn slope(&self, t: f64) -> f64 {
        let t = t.clamp(0.0, 1.0);
        let u = t - 1.0;
        match *self {
            EaseCurve::Linear => 1.0,
            EaseCurve::OutCubic => 3.0 * u * u,
            EaseCurve::OutBack { overshoot } => {
                3.0 * (overshoot + 1.0) * u * u + 2.0 * overshoot * u
            }
        }
    }

    /// Slope at t relative to the slope at the start, clamped to `[floor, 1]`
    pub fn relative_speed(&self, t: f64, floor: f64) -> f64 {
        let start = self.slope(0.0);
        if start <= 0.0 {
            return floor;
        }
        (self.slope(t) / start).clamp(floor, 1.0)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EaseCurve::Linear => "Linear",
            EaseCurve::OutCubic => "OutCubic",
            EaseCurve::OutBack { .. } => "OutBack",
        }
    }
}

/// Front-load perceived motion: `raw^exponent`, with raw clamped to 0.0 - 1.0
#[inline]
pub fn shape_progress(raw: f64, exponent: f64) -> f64 {
    raw.clamp(0.0, 1.0).powf(exponent)
}
