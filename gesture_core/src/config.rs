//! Tuning knobs for the interpreter.
//!
//! Everything here is a plain number with a documented range.  Values are set
//! once per session (or between gestures) and never change mid-frame.

use crate::error::ConfigError;

// ════════════════════════════════════════════════════════════════════════════
// SmoothingConfig
// ════════════════════════════════════════════════════════════════════════════

/// Per-signal EMA coefficients, each in (0, 1].  Higher = more responsive.
#[derive(Clone, Debug, PartialEq)]
pub struct SmoothingConfig {
    pub position_alpha:    f64,
    pub palm_facing_alpha: f64,
    pub resonance_alpha:   f64,
    pub reverb_alpha:      f64,
    pub depth_alpha:       f64,
    pub velocity_alpha:    f64,
    pub pinch_alpha:       f64,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        SmoothingConfig {
            position_alpha:    0.35,
            palm_facing_alpha: 0.3,
            resonance_alpha:   0.3,
            reverb_alpha:      0.25,
            depth_alpha:       0.5,
            velocity_alpha:    0.4,
            pinch_alpha:       0.6,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ZoneConfig
// ════════════════════════════════════════════════════════════════════════════

/// Depth zones and the camera model used to triangulate depth.
#[derive(Clone, Debug, PartialEq)]
pub struct ZoneConfig {
    /// Enter the pad zone at or below this depth (m).
    pub pad_enter_m:          f64,
    /// Stay in the pad zone while at or below this depth (m).  > `pad_enter_m`.
    pub pad_exit_m:           f64,
    /// Outer edge of the hover/pointer zone (m).
    pub pointer_max_m:        f64,
    /// Horizontal camera field of view, degrees, in (0, 180).
    pub fov_deg:              f64,
    /// Fraction of the normalized range that spans the full control surface,
    /// in (0, 1].  0.8 → the central 80 % of the image maps onto 0..1.
    pub active_mapping_scale: f64,
    /// Real-world wrist–palm length used for triangulation (m).
    pub reference_length_m:   f64,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        ZoneConfig {
            pad_enter_m:          0.30,
            pad_exit_m:           0.32,
            pointer_max_m:        0.55,
            fov_deg:              60.0,
            active_mapping_scale: 0.8,
            reference_length_m:   0.085,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// PinchConfig
// ════════════════════════════════════════════════════════════════════════════

/// Pinch thresholds, in pinch-ratio units (thumb–index span / wrist–palm span).
#[derive(Clone, Debug, PartialEq)]
pub struct PinchConfig {
    /// A pluck fires once the ratio falls below this.
    pub closed_ratio:         f64,
    /// The pluck latch re-arms once the ratio climbs past this.
    pub rearm_ratio:          f64,
    /// Minimum closing speed (ratio units per second) for a pluck.
    pub min_closing_velocity: f64,
    /// Ratio mapped to openness 0.
    pub openness_min:         f64,
    /// Ratio mapped to openness 1.
    pub openness_max:         f64,
}

impl Default for PinchConfig {
    fn default() -> Self {
        PinchConfig {
            closed_ratio:         0.35,
            rearm_ratio:          0.55,
            min_closing_velocity: 1.5,
            openness_min:         0.2,
            openness_max:         1.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// EnvelopeConfig
// ════════════════════════════════════════════════════════════════════════════

/// Speed → attack/release shaping.  All times in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct EnvelopeConfig {
    /// Approach speed (m/s) mapped to the slow end of the curve.
    pub approach_speed_min: f64,
    /// Approach speed (m/s) mapped to the fast end of the curve.
    pub approach_speed_max: f64,
    /// Response exponent in (0, 1]; < 1 spreads out the low speeds.
    pub curve_exponent:     f64,
    pub pad_attack_slow:    f64,
    pub pad_attack_fast:    f64,
    pub pad_release_slow:   f64,
    pub pad_release_fast:   f64,
    /// Pinch closing speed (ratio/s) mapped to the slow end.
    pub pluck_speed_min:    f64,
    /// Pinch closing speed (ratio/s) mapped to the fast end.
    pub pluck_speed_max:    f64,
    pub pluck_attack_slow:  f64,
    pub pluck_attack_fast:  f64,
    /// Plucks always release with this.
    pub pluck_release:      f64,
    /// Release used by forced (safety) releases.
    pub default_release:    f64,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig {
            approach_speed_min: 0.05,
            approach_speed_max: 1.0,
            curve_exponent:     0.6,
            pad_attack_slow:    0.6,
            pad_attack_fast:    0.02,
            pad_release_slow:   1.2,
            pad_release_fast:   0.08,
            pluck_speed_min:    1.5,
            pluck_speed_max:    12.0,
            pluck_attack_slow:  0.02,
            pluck_attack_fast:  0.003,
            pluck_release:      0.25,
            default_release:    0.15,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ReverbConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct ReverbConfig {
    /// Ceiling for the wet level, in [0, 1].
    pub max_wet:        f64,
    /// The wet channel only switches on above this level.
    pub enable_epsilon: f64,
}

impl Default for ReverbConfig {
    fn default() -> Self {
        ReverbConfig { max_wet: 0.6, enable_epsilon: 0.02 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SafetyConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct SafetyConfig {
    /// Consecutive frames without a sound hand before the voice is released.
    pub lost_frame_threshold: u32,
    /// Upper bound on a pluck's lifetime (s).
    pub pluck_max_duration:   f64,
    /// A voice outside the pad zone for this long is released (s).
    pub stuck_voice_timeout:  f64,
    /// A voice without a parameter update for this long is released (s).
    pub stale_update_timeout: f64,
}

impl Default for SafetyConfig {
    fn default() -> Self {
        SafetyConfig {
            lost_frame_threshold: 6,
            pluck_max_duration:   0.4,
            stuck_voice_timeout:  2.0,
            stale_update_timeout: 1.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RoleConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RoleConfig {
    /// Hold the previous filter/sound mapping for one frame when the labels
    /// flip but the hands did not move.  Off by default.
    pub sticky_roles: bool,
}

// ════════════════════════════════════════════════════════════════════════════
// InterpreterConfig
// ════════════════════════════════════════════════════════════════════════════

/// Complete configuration for a [`GestureInterpreter`](crate::GestureInterpreter).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InterpreterConfig {
    pub smoothing: SmoothingConfig,
    pub zone:      ZoneConfig,
    pub pinch:     PinchConfig,
    pub envelope:  EnvelopeConfig,
    pub reverb:    ReverbConfig,
    pub safety:    SafetyConfig,
    pub roles:     RoleConfig,
}

impl InterpreterConfig {
    /// Tuning for a webcam landmark model (same as `default()`).
    pub fn webcam() -> Self { Self::default() }

    /// Tuning for a depth-sensing plugin: its depth channel is noisier frame
    /// to frame and it drops hands more often, so depth and velocity are
    /// smoothed harder and more lost frames are tolerated.
    pub fn depth_sensor() -> Self {
        let mut cfg = Self::default();
        cfg.smoothing.depth_alpha       = 0.25;
        cfg.smoothing.velocity_alpha    = 0.2;
        cfg.safety.lost_frame_threshold = 12;
        cfg
    }

    /// Check every knob against its documented range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.smoothing;
        for (name, value) in [
            ("position_alpha",    s.position_alpha),
            ("palm_facing_alpha", s.palm_facing_alpha),
            ("resonance_alpha",   s.resonance_alpha),
            ("reverb_alpha",      s.reverb_alpha),
            ("depth_alpha",       s.depth_alpha),
            ("velocity_alpha",    s.velocity_alpha),
            ("pinch_alpha",       s.pinch_alpha),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                return Err(ConfigError::Alpha { name, value });
            }
        }

        let z = &self.zone;
        if !(z.pad_enter_m > 0.0 && z.pad_enter_m < z.pad_exit_m) {
            return Err(ConfigError::PadHysteresis { enter: z.pad_enter_m, exit: z.pad_exit_m });
        }
        if z.pointer_max_m < z.pad_exit_m {
            return Err(ConfigError::PointerInsidePad { pointer: z.pointer_max_m, exit: z.pad_exit_m });
        }
        if !(z.fov_deg > 0.0 && z.fov_deg < 180.0) {
            return Err(ConfigError::OutOfRange { name: "fov_deg", range: "(0, 180)", value: z.fov_deg });
        }
        if !(z.active_mapping_scale > 0.0 && z.active_mapping_scale <= 1.0) {
            return Err(ConfigError::OutOfRange {
                name: "active_mapping_scale", range: "(0, 1]", value: z.active_mapping_scale,
            });
        }
        positive("reference_length_m", z.reference_length_m)?;

        let p = &self.pinch;
        if !(p.closed_ratio < p.rearm_ratio) {
            return Err(ConfigError::PinchHysteresis { closed: p.closed_ratio, rearm: p.rearm_ratio });
        }
        positive("min_closing_velocity", p.min_closing_velocity)?;
        ordered("openness", p.openness_min, p.openness_max)?;

        let e = &self.envelope;
        ordered("approach_speed", e.approach_speed_min, e.approach_speed_max)?;
        ordered("pluck_speed", e.pluck_speed_min, e.pluck_speed_max)?;
        if !(e.curve_exponent > 0.0 && e.curve_exponent <= 1.0) {
            return Err(ConfigError::OutOfRange { name: "curve_exponent", range: "(0, 1]", value: e.curve_exponent });
        }
        for (name, value) in [
            ("pad_attack_slow",   e.pad_attack_slow),
            ("pad_attack_fast",   e.pad_attack_fast),
            ("pad_release_slow",  e.pad_release_slow),
            ("pad_release_fast",  e.pad_release_fast),
            ("pluck_attack_slow", e.pluck_attack_slow),
            ("pluck_attack_fast", e.pluck_attack_fast),
            ("pluck_release",     e.pluck_release),
            ("default_release",   e.default_release),
        ] {
            positive_time(name, value)?;
        }

        let r = &self.reverb;
        if !(0.0..=1.0).contains(&r.max_wet) {
            return Err(ConfigError::OutOfRange { name: "max_wet", range: "[0, 1]", value: r.max_wet });
        }
        if !(0.0..1.0).contains(&r.enable_epsilon) {
            return Err(ConfigError::OutOfRange { name: "enable_epsilon", range: "[0, 1)", value: r.enable_epsilon });
        }

        let sf = &self.safety;
        if sf.lost_frame_threshold == 0 {
            return Err(ConfigError::LostFrameThreshold);
        }
        positive_time("pluck_max_duration",   sf.pluck_max_duration)?;
        positive_time("stuck_voice_timeout",  sf.stuck_voice_timeout)?;
        positive_time("stale_update_timeout", sf.stale_update_timeout)?;

        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 { Ok(()) } else { Err(ConfigError::OutOfRange { name, range: "(0, ∞)", value }) }
}

fn positive_time(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 { Ok(()) } else { Err(ConfigError::Time { name, value }) }
}

fn ordered(name: &'static str, min: f64, max: f64) -> Result<(), ConfigError> {
    if min < max { Ok(()) } else { Err(ConfigError::Bounds { name, min, max }) }
}
