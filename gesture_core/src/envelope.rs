//! Gesture speed → envelope time.
//!
//! A slow drift into range swells in, a sharp jab snaps in.  Speeds are
//! normalized against configured bounds, bent by a sub-linear curve so that
//! differences among slow gestures stay audible, and then interpolated
//! between a "slow" and a "fast" time constant.

use crate::config::EnvelopeConfig;

/// Normalize `speed` into [0, 1] against `[min, max]` and apply `t^exponent`.
pub fn speed_curve(speed: f64, min: f64, max: f64, exponent: f64) -> f64 {
    if !speed.is_finite() || max <= min {
        return 0.0;
    }
    ((speed - min) / (max - min)).clamp(0.0, 1.0).powf(exponent)
}

/// Linear interpolation from `slow` (t = 0) to `fast` (t = 1).
pub fn lerp_time(slow: f64, fast: f64, t: f64) -> f64 {
    slow + (fast - slow) * t
}

impl EnvelopeConfig {
    /// Attack for a pad entered at `approach_speed` (m/s).
    pub fn pad_attack(&self, approach_speed: f64) -> f64 {
        let t = speed_curve(approach_speed, self.approach_speed_min, self.approach_speed_max, self.curve_exponent);
        lerp_time(self.pad_attack_slow, self.pad_attack_fast, t)
    }

    /// Release for a pad left at `retreat_speed` (m/s).
    pub fn pad_release(&self, retreat_speed: f64) -> f64 {
        let t = speed_curve(retreat_speed, self.approach_speed_min, self.approach_speed_max, self.curve_exponent);
        lerp_time(self.pad_release_slow, self.pad_release_fast, t)
    }

    /// Attack for a pluck closed at `closing_speed` (ratio/s).
    pub fn pluck_attack(&self, closing_speed: f64) -> f64 {
        let t = speed_curve(closing_speed, self.pluck_speed_min, self.pluck_speed_max, self.curve_exponent);
        lerp_time(self.pluck_attack_slow, self.pluck_attack_fast, t)
    }
}
