//! # gesture_midi
//!
//! A [`SoundEngine`](gesture_core::SoundEngine) that plays the gesture
//! interpreter's voice on any MIDI synthesiser, and a recorder that captures
//! the performance as a Standard MIDI File (Type 0, single track).
//!
//! The voice is one held note whose pitch glides by pitch bend, so the hand
//! plays continuously between semitones the way a theremin does.
//!
//! ## Control → MIDI mapping
//!
//! | Control | Message |
//! |---|---|
//! | Note on / off | Note On / Note Off on the root note |
//! | X (0..1) | 14-bit pitch bend across ± bend range |
//! | Y (0..1) | CC 11 expression |
//! | Attack time | CC 73 (log scale, 1 ms‥4 s) |
//! | Release time | CC 72 (log scale, 1 ms‥4 s) |
//! | Filter cutoff mod | CC 74 |
//! | Filter resonance | CC 71 |
//! | Reverb wet | CC 91 |
//! | Reverb dry | CC 7 |
//!
//! The bend range is announced once with RPN 0 by [`MidiSoundEngine::start`].

pub mod engine;
pub mod message;
pub mod patch;
pub mod recorder;

pub use engine::{EngineConfig, MidiSoundEngine};
pub use message::{cc_to_time, time_to_cc, unit_to_7bit, unit_to_bend};
pub use patch::Patch;
pub use recorder::{Recorder, Recording};

// ════════════════════════════════════════════════════════════════════════════
// MidiSink: where channel messages go
// ════════════════════════════════════════════════════════════════════════════

/// A destination for raw MIDI channel messages.
///
/// Sends are fire-and-forget: a sink that fails logs and drops the message,
/// the frame loop never waits on it.
pub trait MidiSink {
    fn send(&mut self, message: &[u8]);
}

impl<S: MidiSink + ?Sized> MidiSink for Box<S> {
    fn send(&mut self, message: &[u8]) { (**self).send(message) }
}

impl<S: MidiSink + ?Sized> MidiSink for &mut S {
    fn send(&mut self, message: &[u8]) { (**self).send(message) }
}

/// Collects every message; handy for tests and offline rendering.
impl MidiSink for Vec<Vec<u8>> {
    fn send(&mut self, message: &[u8]) { self.push(message.to_vec()); }
}

/// Discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl MidiSink for NullSink {
    fn send(&mut self, _message: &[u8]) {}
}
