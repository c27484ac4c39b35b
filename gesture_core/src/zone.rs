//! Depth zones with hysteresis, and monocular depth triangulation.

use crate::config::ZoneConfig;
use crate::frame::{HandObservation, MIN_SPAN_PX};

/// Proximity class of the sound hand.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Zone {
    /// Out of range.
    #[default]
    None,
    /// Close enough to hover and pluck.
    Pointer,
    /// Close enough to hold a sustained voice.
    Pad,
}

impl Zone {
    pub fn name(self) -> &'static str {
        match self {
            Zone::None    => "none",
            Zone::Pointer => "pointer",
            Zone::Pad     => "pad",
        }
    }
}

/// Classify `depth` given last frame's zone.
///
/// Pad membership uses two thresholds: a hand already in the pad stays there
/// up to `pad_exit_m`, anyone else has to come within `pad_enter_m`.  With no
/// depth this frame the previous zone is held.
pub fn classify(previous: Zone, depth: Option<f64>, cfg: &ZoneConfig) -> Zone {
    let Some(d) = depth else { return previous };

    let pad_limit = if previous == Zone::Pad { cfg.pad_exit_m } else { cfg.pad_enter_m };
    if d <= pad_limit {
        Zone::Pad
    } else if d <= cfg.pointer_max_m {
        Zone::Pointer
    } else {
        Zone::None
    }
}

/// Pinhole focal length in pixels for a horizontal field of view.
pub fn focal_length_px(width_px: f64, fov_deg: f64) -> f64 {
    (width_px / 2.0) / (fov_deg.to_radians() / 2.0).tan()
}

/// `depth = reference_length * focal / separation`.
///
/// A near-zero separation yields no estimate rather than infinity.
pub fn estimate_depth(separation_px: f64, reference_length_m: f64, focal_px: f64) -> Option<f64> {
    if !separation_px.is_finite() || separation_px < MIN_SPAN_PX {
        return None;
    }
    Some(reference_length_m * focal_px / separation_px)
}

/// Depth for one hand: the sensor value when the backend supplies one,
/// otherwise triangulated from the wrist–palm span.
pub fn hand_depth(
    hand:      &HandObservation,
    width_px:  f64,
    height_px: f64,
    cfg:       &ZoneConfig,
) -> Option<f64> {
    if let Some(d) = hand.depth_m {
        return (d.is_finite() && d > 0.0).then_some(d);
    }
    let span = hand.scale_px(width_px, height_px)?;
    estimate_depth(span, cfg.reference_length_m, focal_length_px(width_px, cfg.fov_deg))
}
