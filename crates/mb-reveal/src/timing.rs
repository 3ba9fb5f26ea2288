//! Timing profiles for reveal spins

use serde::{Deserialize, Serialize};

use crate::curve::EaseCurve;

/// Spin speed profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpinSpeed {
    /// Normal play
    #[default]
    Normal,
    /// Accelerated reveal
    Fast,
    /// Scaled or hand-tuned timing
    Custom,
}

/// Detailed reveal timing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealTiming {
    /// Profile type
    pub profile: SpinSpeed,

    /// Total spin duration (ms)
    pub duration_ms: f64,

    /// Exponent applied to raw progress before easing (< 1.0 front-loads motion)
    pub shaping_exponent: f64,

    /// Raw progress after which ticks are flagged as heavy settle ticks
    pub settle_phase_threshold: f64,

    /// Lower bound for tick intensity
    pub min_tick_intensity: f64,

    /// Travel curve
    pub curve: EaseCurve,

    /// Host frame interval used by clocks (ms)
    pub frame_interval_ms: f64,
}

impl RevealTiming {
    /// Normal play
    pub fn normal() -> Self {
        Self {
            profile: SpinSpeed::Normal,
            duration_ms: 7000.0,
            shaping_exponent: 0.75,
            settle_phase_threshold: 0.88,
            min_tick_intensity: 0.05,
            curve: EaseCurve::default(),
            frame_interval_ms: 1000.0 / 60.0,
        }
    }

    /// Accelerated reveal (same landing, shorter run)
    pub fn fast() -> Self {
        Self {
            profile: SpinSpeed::Fast,
            duration_ms: 2500.0,
            ..Self::normal()
        }
    }

    /// Get timing for profile
    pub fn from_profile(profile: SpinSpeed) -> Self {
        match profile {
            SpinSpeed::Normal => Self::normal(),
            SpinSpeed::Fast => Self::fast(),
            SpinSpeed::Custom => Self::normal(),
        }
    }

    /// Scale duration by factor (< 1.0 = faster)
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            profile: SpinSpeed::Custom,
            duration_ms: (self.duration_ms * factor).max(0.0),
            ..self.clone()
        }
    }

    /// Expected frame count at the configured frame interval
    pub fn expected_frames(&self) -> u64 {
        if self.frame_interval_ms <= 0.0 {
            return 1;
        }
        (self.duration_ms / self.frame_interval_ms).ceil() as u64 + 1
    }
}

impl Default for RevealTiming {
    fn default() -> Self {
        Self::normal()
    }
}
