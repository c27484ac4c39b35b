//! # gesture_core
//!
//! Turns a noisy per-frame stream of two-hand observations into note
//! lifecycle events and continuous controls for a sound engine, with no
//! start/stop button anywhere.
//!
//! ## Pipeline
//!
//! | Stage | Module | Output |
//! |---|---|---|
//! | Role assignment | [`roles`] | which hand is *filter*, which is *sound* |
//! | Smoothing | [`smoothing`] | EMA'd position, depth, velocity, pinch, facing |
//! | Zone classifier | [`zone`] | `None` / `Pointer` / `Pad` with hysteresis |
//! | Gesture arbiter | [`arbiter`] | note on / update / off, cursor hints |
//! | Safety supervisor | [`safety`] | forced releases |
//! | Output adapter | [`output`] | [`OutputEvent`] batches, [`dispatch`] |
//!
//! ## Gestures
//!
//! | Gesture | Hand | Result |
//! |---|---|---|
//! | Push into the pad zone | Sound | Sustained voice; attack ∝ approach speed |
//! | Move inside the pad | Sound | X/Y voice updates |
//! | Pull out of the pad | Sound | Release; shorter when pulled out fast |
//! | Fast pinch while hovering | Sound | Short pluck, auto-released |
//! | Raise / lower | Filter | Resonance |
//! | Turn palm to camera | Filter | Cutoff modulation |
//! | Open / close pinch | Filter | Reverb send |
//!
//! The crate is pure: no I/O, no threads, no clocks.  The host supplies a
//! timestamp with each frame and routes the returned events.

pub mod arbiter;
pub mod config;
pub mod envelope;
pub mod error;
pub mod frame;
pub mod interpreter;
pub mod landmarks;
pub mod output;
pub mod roles;
pub mod safety;
pub mod smoothing;
pub mod zone;

pub use arbiter::{Phase, PinchReading, ReleaseReason};
pub use config::{
    EnvelopeConfig, InterpreterConfig, PinchConfig, ReverbConfig, RoleConfig, SafetyConfig,
    SmoothingConfig, ZoneConfig,
};
pub use error::ConfigError;
pub use frame::{HandObservation, Handedness, LandmarkFrame, Point2, Timestamp};
pub use interpreter::GestureInterpreter;
pub use landmarks::{HandLandmarks, Point3};
pub use output::{dispatch, CursorView, OutputEvent, SoundEngine};
pub use smoothing::ema;
pub use zone::Zone;
