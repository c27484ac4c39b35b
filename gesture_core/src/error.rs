//! Error types for the gesture interpreter.
//!
//! The per-frame path never fails; these only surface when a configuration is
//! built or swapped.

use thiserror::Error;

/// Configuration rejected by [`InterpreterConfig::validate`](crate::InterpreterConfig::validate)
/// or refused by [`GestureInterpreter::set_config`](crate::GestureInterpreter::set_config).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("smoothing coefficient `{name}` must be in (0, 1], got {value}")]
    Alpha { name: &'static str, value: f64 },

    #[error("pad zone needs enter < exit, got enter={enter} m exit={exit} m")]
    PadHysteresis { enter: f64, exit: f64 },

    #[error("pointer zone ({pointer} m) must reach at least the pad exit ({exit} m)")]
    PointerInsidePad { pointer: f64, exit: f64 },

    #[error("pinch re-arm ratio ({rearm}) must exceed the closed ratio ({closed})")]
    PinchHysteresis { closed: f64, rearm: f64 },

    #[error("`{name}` needs min < max, got min={min} max={max}")]
    Bounds { name: &'static str, min: f64, max: f64 },

    #[error("`{name}` must be in {range}, got {value}")]
    OutOfRange { name: &'static str, range: &'static str, value: f64 },

    #[error("time constant `{name}` must be positive, got {value} s")]
    Time { name: &'static str, value: f64 },

    #[error("lost-frame threshold must be at least 1")]
    LostFrameThreshold,

    #[error("configuration can only change between gestures (a voice is active)")]
    GestureInProgress,
}
