//! Exponential moving-average state.
//!
//! Every tracked quantity keeps its own last value and is blended toward each
//! new sample with its own coefficient.  A slot stays `None` until its first
//! sample and never returns to `None` until [`SmoothingState::reset`].

use crate::frame::Timestamp;

/// Frame intervals shorter than this (seconds) give no velocity estimate.
pub const MIN_DT: f64 = 1e-4;

/// One EMA step.  With no previous value the sample passes through untouched.
pub fn ema(previous: Option<f64>, next: f64, alpha: f64) -> f64 {
    match previous {
        None    => next,
        Some(p) => p + (next - p) * alpha,
    }
}

/// Smoothed depth plus the approach velocity derived from it.
///
/// Velocity is positive when the hand moves toward the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthMotion {
    pub depth:             f64,
    pub approach_instant:  Option<f64>,
    pub approach_smoothed: Option<f64>,
}

impl DepthMotion {
    /// Larger of the two approach estimates (0 when neither exists).
    pub fn approach_speed(&self) -> f64 {
        max_opt(self.approach_instant, self.approach_smoothed)
    }

    /// Larger of the two outward (away from camera) estimates.
    pub fn retreat_speed(&self) -> f64 {
        max_opt(self.approach_instant.map(|v| -v), self.approach_smoothed.map(|v| -v))
    }
}

fn max_opt(a: Option<f64>, b: Option<f64>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) => a.max(b).max(0.0),
        (Some(v), None) | (None, Some(v)) => v.max(0.0),
        (None, None) => 0.0,
    }
}

/// Smoothed signals for one logical role (filter or sound).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SmoothingState {
    pub x:           Option<f64>,
    pub y:           Option<f64>,
    pub palm_facing: Option<f64>,
    pub resonance:   Option<f64>,
    /// Smoothed pinch openness feeding the reverb send.
    pub reverb:      Option<f64>,
    pub depth:       Option<f64>,
    pub velocity:    Option<f64>,
    pub pinch:       Option<f64>,
    depth_at:        Option<Timestamp>,
}

impl SmoothingState {
    pub fn new() -> Self { Self::default() }

    /// Blend a new palm position; returns the smoothed `(x, y)`.
    pub fn observe_position(&mut self, x: f64, y: f64, alpha: f64) -> (f64, f64) {
        let sx = ema(self.x, x, alpha);
        let sy = ema(self.y, y, alpha);
        self.x = Some(sx);
        self.y = Some(sy);
        (sx, sy)
    }

    /// Blend a new depth sample and update the approach velocity.
    ///
    /// The instantaneous velocity is the change in smoothed depth over the
    /// frame interval; it is absent on the first sample and when the interval
    /// is too short to divide by.
    pub fn observe_depth(
        &mut self,
        depth:          f64,
        now:            Timestamp,
        depth_alpha:    f64,
        velocity_alpha: f64,
    ) -> DepthMotion {
        let previous = self.depth.zip(self.depth_at);
        let smoothed = ema(self.depth, depth, depth_alpha);

        let instant = previous.and_then(|(d, at)| {
            let dt = now.since(at);
            (dt >= MIN_DT).then(|| (d - smoothed) / dt)
        });
        if let Some(v) = instant {
            self.velocity = Some(ema(self.velocity, v, velocity_alpha));
        }

        self.depth    = Some(smoothed);
        self.depth_at = Some(now);

        DepthMotion {
            depth:             smoothed,
            approach_instant:  instant,
            approach_smoothed: self.velocity,
        }
    }

    pub fn observe_pinch(&mut self, ratio: f64, alpha: f64) -> f64 {
        let v = ema(self.pinch, ratio, alpha);
        self.pinch = Some(v);
        v
    }

    pub fn observe_palm_facing(&mut self, facing: f64, alpha: f64) -> f64 {
        let v = ema(self.palm_facing, facing, alpha);
        self.palm_facing = Some(v);
        v
    }

    pub fn observe_resonance(&mut self, height: f64, alpha: f64) -> f64 {
        let v = ema(self.resonance, height, alpha);
        self.resonance = Some(v);
        v
    }

    pub fn observe_reverb(&mut self, openness: f64, alpha: f64) -> f64 {
        let v = ema(self.reverb, openness, alpha);
        self.reverb = Some(v);
        v
    }

    /// Back to the pre-first-observation state.
    pub fn reset(&mut self) { *self = Self::default(); }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn first_sample_passes_through() {
        assert_eq!(ema(None, 0.42, 0.1), 0.42);
    }

    #[test]
    fn blends_toward_sample() {
        assert!((ema(Some(0.0), 1.0, 0.35) - 0.35).abs() < 1e-12);
    }

    #[test]
    fn state_never_returns_to_none() {
        let mut s = SmoothingState::new();
        assert_eq!(s.pinch, None);
        s.observe_pinch(0.8, 0.5);
        s.observe_pinch(0.2, 0.5);
        assert!(s.pinch.is_some());
        s.reset();
        assert_eq!(s.pinch, None);
    }

    #[test]
    fn approach_velocity_sign() {
        let mut s = SmoothingState::new();
        let t0 = Timestamp::from_secs(0.0);
        let first = s.observe_depth(0.5, t0, 1.0, 1.0);
        assert_eq!(first.approach_instant, None);
        assert_eq!(first.approach_speed(), 0.0);

        // 0.1 m closer in 0.1 s → +1 m/s
        let m = s.observe_depth(0.4, t0.after(0.1), 1.0, 1.0);
        assert!((m.approach_instant.unwrap() - 1.0).abs() < 1e-9);
        assert!((m.approach_speed() - 1.0).abs() < 1e-9);
        assert_eq!(m.retreat_speed(), 0.0);

        let back = s.observe_depth(0.6, t0.after(0.2), 1.0, 1.0);
        assert!((back.retreat_speed() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn zero_interval_gives_no_velocity() {
        let mut s = SmoothingState::new();
        let t = Timestamp::from_secs(1.0);
        s.observe_depth(0.5, t, 1.0, 1.0);
        let m = s.observe_depth(0.4, t, 1.0, 1.0);
        assert_eq!(m.approach_instant, None);
        assert_eq!(m.depth, 0.4);
    }

    proptest! {
        #[test]
        fn ema_without_history_is_identity(v in -10.0f64..10.0, a in 0.001f64..=1.0) {
            prop_assert_eq!(ema(None, v, a), v);
        }

        #[test]
        fn ema_fixed_point(p in -10.0f64..10.0, a in 0.001f64..=1.0) {
            prop_assert_eq!(ema(Some(p), p, a), p);
        }

        #[test]
        fn ema_converges_monotonically(
            start  in -10.0f64..10.0,
            target in -10.0f64..10.0,
            a      in 0.01f64..0.99,
        ) {
            let mut v = start;
            let mut gap = (target - v).abs();
            for _ in 0..50 {
                v = ema(Some(v), target, a);
                let g = (target - v).abs();
                prop_assert!(g <= gap + 1e-12);
                gap = g;
            }
        }
    }
}
