//! Gesture arbiter: the one stateful decision point.
//!
//! Each frame the arbiter sees the sound hand's zone, pinch ratio (raw and
//! smoothed) and depth motion, and decides whether a voice starts, moves, or stops.
//!
//! ```text
//!            zone = Pointer                 pinch closes fast (armed)
//!   Idle ─────────────────────▶ Hovering ─────────────────────────▶ Pluck
//!    ▲ ▲         zone = None        │                                 │
//!    │ └────────────────────────────┘                                 │
//!    │                              │ zone = Pad                      │
//!    │ zone = Pad                   ▼                                 │
//!    └──────────────────────────── Pad      max duration / safety ────┘
//!           zone leaves Pad                        (→ Idle)
//! ```
//!
//! At most one voice exists at a time.  Pad entry disarms the pluck latch;
//! the latch re-arms once the pinch opens past the re-arm ratio.  Pinch
//! history is dropped whenever a frame arrives without a pinch reading, so
//! closing velocity is never measured across a tracking gap.

use tracing::{debug, info, warn};

use crate::config::{EnvelopeConfig, PinchConfig};
use crate::frame::Timestamp;
use crate::output::OutputEvent;
use crate::smoothing::{DepthMotion, MIN_DT};
use crate::zone::Zone;

// ════════════════════════════════════════════════════════════════════════════
// Phase / ReleaseReason
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    #[default]
    Idle,
    Hovering,
    Pad,
    Pluck,
}

/// Why a voice was released.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReleaseReason {
    /// The hand left the pad zone.
    ZoneExit,
    /// A pluck reached its maximum duration.
    PluckElapsed,
    /// Too many consecutive frames without a sound hand.
    LostHand,
    /// Voice held outside the pad zone for too long.
    StuckVoice,
    /// No parameter update for too long.
    StaleUpdate,
    /// Interpreter torn down.
    Shutdown,
}

impl ReleaseReason {
    /// True for releases the safety supervisor forces.
    pub fn is_forced(self) -> bool {
        !matches!(self, ReleaseReason::ZoneExit | ReleaseReason::PluckElapsed)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// GestureState
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct GestureState {
    pub phase:             Phase,
    /// A pluck may fire only while armed.
    pub pluck_armed:       bool,
    pub voice_active:      bool,
    pub gesture_started:   Option<Timestamp>,
    /// Last time the voice received an onset or position update.
    pub last_update:       Option<Timestamp>,
    pub lost_frames:       u32,
    pub previous_pinch:    Option<(PinchReading, Timestamp)>,
    /// Set while a voice is active outside the pad zone.
    pub outside_pad_since: Option<Timestamp>,
    pub cursor_visible:    bool,
}

impl Default for GestureState {
    fn default() -> Self {
        GestureState {
            phase:             Phase::Idle,
            pluck_armed:       true,
            voice_active:      false,
            gesture_started:   None,
            last_update:       None,
            lost_frames:       0,
            previous_pinch:    None,
            outside_pad_since: None,
            cursor_visible:    false,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SoundReading: one frame of sound-hand input
// ════════════════════════════════════════════════════════════════════════════

/// One frame's pinch ratio, as measured and after smoothing.
///
/// The pluck gate and closing velocity read the raw ratio, since smoothing
/// lags a fast close by several frames at low frame rates.  Re-arming waits
/// for both values to open.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PinchReading {
    pub raw:      f64,
    pub smoothed: f64,
}

impl PinchReading {
    /// A reading with no smoothing lag.
    pub fn steady(ratio: f64) -> Self { PinchReading { raw: ratio, smoothed: ratio } }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SoundReading {
    /// Smoothed palm position mapped onto the control surface (screen
    /// orientation, y down).
    pub surface: (f64, f64),
    pub zone:    Zone,
    /// Pinch ratio, when the pinch points were visible.
    pub pinch:   Option<PinchReading>,
    /// Depth motion, when a depth estimate exists this frame.
    pub motion:  Option<DepthMotion>,
}

// ════════════════════════════════════════════════════════════════════════════
// Arbiter
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
pub struct Arbiter {
    pinch:    PinchConfig,
    envelope: EnvelopeConfig,
    state:    GestureState,
}

impl Arbiter {
    pub fn new(pinch: PinchConfig, envelope: EnvelopeConfig) -> Self {
        Arbiter { pinch, envelope, state: GestureState::default() }
    }

    pub fn state(&self) -> &GestureState { &self.state }

    pub(crate) fn state_mut(&mut self) -> &mut GestureState { &mut self.state }

    pub fn envelope(&self) -> &EnvelopeConfig { &self.envelope }

    pub(crate) fn reconfigure(&mut self, pinch: PinchConfig, envelope: EnvelopeConfig) {
        self.pinch    = pinch;
        self.envelope = envelope;
    }

    pub(crate) fn reset(&mut self) { self.state = GestureState::default(); }

    /// Advance one frame with the sound hand present.
    pub fn step(&mut self, reading: &SoundReading, now: Timestamp, out: &mut Vec<OutputEvent>) {
        let closing = self.track_pinch(reading.pinch, now);

        match self.state.phase {
            Phase::Idle | Phase::Hovering => match reading.zone {
                Zone::Pad => self.start_pad(reading, now, out),
                Zone::Pointer => {
                    if self.state.phase == Phase::Idle {
                        debug!("idle → hovering");
                        self.state.phase = Phase::Hovering;
                    }
                    match self.pluck_speed(reading.pinch, closing) {
                        Some(speed) => self.start_pluck(reading, speed, now, out),
                        None => self.show_cursor(reading.surface, true, out),
                    }
                }
                Zone::None => {
                    if self.state.phase == Phase::Hovering {
                        debug!("hovering → idle");
                        self.state.phase = Phase::Idle;
                    }
                    self.hide_cursor(out);
                }
            },

            Phase::Pad => {
                if reading.zone == Zone::Pad {
                    let (x, y) = reading.surface;
                    out.push(OutputEvent::NoteUpdate { x, y: 1.0 - y });
                    self.state.last_update = Some(now);
                    self.show_cursor(reading.surface, false, out);
                } else {
                    let speed   = reading.motion.map_or(0.0, |m| m.retreat_speed());
                    let release = self.envelope.pad_release(speed);
                    self.release(ReleaseReason::ZoneExit, release, out);
                    if reading.zone == Zone::Pointer {
                        self.state.phase = Phase::Hovering;
                        self.show_cursor(reading.surface, true, out);
                    } else {
                        self.hide_cursor(out);
                    }
                }
            }

            // Position is frozen at onset; only the cursor follows the hand.
            Phase::Pluck => self.show_cursor(reading.surface, false, out),
        }
    }

    /// Release the active voice for a safety reason.  No-op without a voice.
    pub fn force_release(&mut self, reason: ReleaseReason, release: f64, out: &mut Vec<OutputEvent>) {
        if !self.release(reason, release, out) {
            return;
        }
        if matches!(reason, ReleaseReason::LostHand | ReleaseReason::Shutdown) {
            self.hide_cursor(out);
        }
    }

    /// The sound hand has been gone long enough to stop hovering.
    pub(crate) fn hand_lost(&mut self, out: &mut Vec<OutputEvent>) {
        if self.state.phase == Phase::Hovering {
            debug!("hovering → idle (hand lost)");
            self.state.phase = Phase::Idle;
        }
        self.forget_pinch();
        self.hide_cursor(out);
    }

    /// Drop the pinch history so the next closing velocity starts fresh.
    pub(crate) fn forget_pinch(&mut self) { self.state.previous_pinch = None; }

    // ── pinch latch ───────────────────────────────────────────────────────

    /// Record this frame's pinch, re-arm the latch if the hand opened, and
    /// return the raw closing velocity (ratio/s, positive while closing).
    fn track_pinch(&mut self, pinch: Option<PinchReading>, now: Timestamp) -> Option<f64> {
        let Some(pinch) = pinch else {
            self.forget_pinch();
            return None;
        };
        let closing = self.state.previous_pinch.and_then(|(prev, at)| {
            let dt = now.since(at);
            (dt >= MIN_DT).then(|| (prev.raw - pinch.raw) / dt)
        });
        self.state.previous_pinch = Some((pinch, now));

        let opened = pinch.raw.min(pinch.smoothed);
        if !self.state.pluck_armed && opened > self.pinch.rearm_ratio {
            debug!(ratio = opened, "pluck re-armed");
            self.state.pluck_armed = true;
        }
        closing
    }

    fn pluck_speed(&self, pinch: Option<PinchReading>, closing: Option<f64>) -> Option<f64> {
        let (pinch, speed) = (pinch?, closing?);
        (self.state.pluck_armed
            && pinch.raw < self.pinch.closed_ratio
            && speed >= self.pinch.min_closing_velocity)
            .then_some(speed)
    }

    // ── voice lifecycle ───────────────────────────────────────────────────

    fn start_pad(&mut self, reading: &SoundReading, now: Timestamp, out: &mut Vec<OutputEvent>) {
        let speed  = reading.motion.map_or(0.0, |m| m.approach_speed());
        let attack = self.envelope.pad_attack(speed);
        info!(speed, attack, "pad onset");

        self.state.phase       = Phase::Pad;
        self.state.pluck_armed = false;
        self.start_voice(reading, attack, now, out);
    }

    fn start_pluck(&mut self, reading: &SoundReading, speed: f64, now: Timestamp, out: &mut Vec<OutputEvent>) {
        let attack = self.envelope.pluck_attack(speed);
        info!(speed, attack, "pluck onset");

        self.state.phase       = Phase::Pluck;
        self.state.pluck_armed = false;
        self.start_voice(reading, attack, now, out);
    }

    fn start_voice(&mut self, reading: &SoundReading, attack: f64, now: Timestamp, out: &mut Vec<OutputEvent>) {
        debug_assert!(!self.state.voice_active, "voice already active");
        let (x, y) = reading.surface;

        out.push(OutputEvent::NoteOn { attack });
        out.push(OutputEvent::NoteUpdate { x, y: 1.0 - y });
        self.show_cursor(reading.surface, false, out);
        out.push(OutputEvent::Pulse { x, y });

        self.state.voice_active    = true;
        self.state.gesture_started = Some(now);
        self.state.last_update     = Some(now);
    }

    /// Emit the note-off and drop back to `Idle`.  Returns false when there
    /// was no voice to release.
    fn release(&mut self, reason: ReleaseReason, release: f64, out: &mut Vec<OutputEvent>) -> bool {
        if !self.state.voice_active {
            return false;
        }
        if reason.is_forced() {
            warn!(?reason, release, phase = ?self.state.phase, "forced release");
        } else {
            info!(?reason, release, "release");
        }

        out.push(OutputEvent::NoteOff { release });
        self.state.voice_active      = false;
        self.state.phase             = Phase::Idle;
        self.state.gesture_started   = None;
        self.state.outside_pad_since = None;
        true
    }

    // ── cursor hints ──────────────────────────────────────────────────────

    fn show_cursor(&mut self, (x, y): (f64, f64), hovering: bool, out: &mut Vec<OutputEvent>) {
        out.push(OutputEvent::ShowCursor { x, y, hovering });
        self.state.cursor_visible = true;
    }

    fn hide_cursor(&mut self, out: &mut Vec<OutputEvent>) {
        if self.state.cursor_visible {
            out.push(OutputEvent::HideCursor);
            self.state.cursor_visible = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arbiter() -> Arbiter {
        Arbiter::new(PinchConfig::default(), EnvelopeConfig::default())
    }

    fn reading(zone: Zone, pinch: Option<f64>) -> SoundReading {
        SoundReading { surface: (0.5, 0.25), zone, pinch: pinch.map(PinchReading::steady), motion: None }
    }

    fn lagging(zone: Zone, raw: f64, smoothed: f64) -> SoundReading {
        SoundReading { pinch: Some(PinchReading { raw, smoothed }), ..reading(zone, None) }
    }

    fn at(ms: u32) -> Timestamp { Timestamp::from_secs(ms as f64 / 1000.0) }

    fn count(out: &[OutputEvent], f: impl Fn(&OutputEvent) -> bool) -> usize {
        out.iter().filter(|e| f(e)).count()
    }

    #[test]
    fn pointer_zone_hovers() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pointer, Some(0.9)), at(0), &mut out);
        assert_eq!(a.state().phase, Phase::Hovering);
        assert_eq!(out, [OutputEvent::ShowCursor { x: 0.5, y: 0.25, hovering: true }]);
    }

    #[test]
    fn pad_entry_starts_voice_with_height_axis() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pad, None), at(0), &mut out);
        assert_eq!(a.state().phase, Phase::Pad);
        assert!(a.state().voice_active);
        assert!(!a.state().pluck_armed);
        assert_eq!(out[0], OutputEvent::NoteOn { attack: EnvelopeConfig::default().pad_attack_slow });
        assert_eq!(out[1], OutputEvent::NoteUpdate { x: 0.5, y: 0.75 });
        assert!(out.contains(&OutputEvent::Pulse { x: 0.5, y: 0.25 }));
    }

    #[test]
    fn leaving_pad_to_pointer_releases_and_hovers() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pad, None), at(0), &mut out);
        out.clear();
        a.step(&reading(Zone::Pointer, None), at(33), &mut out);
        assert_eq!(out[0], OutputEvent::NoteOff { release: EnvelopeConfig::default().pad_release_slow });
        assert_eq!(a.state().phase, Phase::Hovering);
        assert!(!a.state().voice_active);
    }

    #[test]
    fn leaving_pad_to_none_hides_cursor() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pad, None), at(0), &mut out);
        out.clear();
        a.step(&reading(Zone::None, None), at(33), &mut out);
        assert_eq!(a.state().phase, Phase::Idle);
        assert_eq!(out.last(), Some(&OutputEvent::HideCursor));
    }

    #[test]
    fn fast_pinch_plucks_once() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pointer, Some(0.9)), at(0), &mut out);
        a.step(&reading(Zone::Pointer, Some(0.30)), at(50), &mut out);
        assert_eq!(a.state().phase, Phase::Pluck);
        assert_eq!(count(&out, |e| matches!(e, OutputEvent::NoteOn { .. })), 1);
    }

    #[test]
    fn slow_pinch_does_not_pluck() {
        let mut a = arbiter();
        let mut out = Vec::new();
        // 0.4 ratio over 1 s → 0.4/s, under the 1.5/s minimum
        a.step(&reading(Zone::Pointer, Some(0.6)), at(0), &mut out);
        a.step(&reading(Zone::Pointer, Some(0.2)), at(1000), &mut out);
        assert_eq!(a.state().phase, Phase::Hovering);
        assert!(!a.state().voice_active);
    }

    #[test]
    fn pluck_needs_rearm_before_second_trigger() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pointer, Some(0.9)), at(0), &mut out);
        a.step(&reading(Zone::Pointer, Some(0.30)), at(50), &mut out);
        a.force_release(ReleaseReason::PluckElapsed, 0.25, &mut out);
        assert_eq!(a.state().phase, Phase::Idle);

        // Reopen only to 0.5 (< re-arm 0.55), close fast again.
        a.step(&reading(Zone::Pointer, Some(0.5)), at(100), &mut out);
        a.step(&reading(Zone::Pointer, Some(0.30)), at(150), &mut out);
        assert_eq!(a.state().phase, Phase::Hovering);
        assert_eq!(count(&out, |e| matches!(e, OutputEvent::NoteOn { .. })), 1);

        // Reopen past re-arm, close fast → second pluck.
        a.step(&reading(Zone::Pointer, Some(0.9)), at(200), &mut out);
        assert!(a.state().pluck_armed);
        a.step(&reading(Zone::Pointer, Some(0.30)), at(250), &mut out);
        assert_eq!(count(&out, |e| matches!(e, OutputEvent::NoteOn { .. })), 2);
    }

    #[test]
    fn raw_close_plucks_while_smoothed_ratio_lags() {
        let mut a = arbiter();
        let mut out = Vec::new();
        // One 15 fps frame: raw snaps shut, alpha 0.6 smoothing only reaches 0.51.
        a.step(&reading(Zone::Pointer, Some(0.9)), at(0), &mut out);
        a.step(&lagging(Zone::Pointer, 0.25, 0.51), at(67), &mut out);
        assert_eq!(a.state().phase, Phase::Pluck);
        assert_eq!(count(&out, |e| matches!(e, OutputEvent::NoteOn { .. })), 1);
    }

    #[test]
    fn smoothed_close_alone_does_not_pluck() {
        let mut a = arbiter();
        let mut out = Vec::new();
        // Smoothed value still falling while the raw hand is already open.
        a.step(&lagging(Zone::Pointer, 0.5, 0.9), at(0), &mut out);
        a.step(&lagging(Zone::Pointer, 0.5, 0.3), at(50), &mut out);
        assert_eq!(a.state().phase, Phase::Hovering);
    }

    #[test]
    fn smoothing_lag_after_gap_does_not_pluck() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pointer, Some(0.9)), at(0), &mut out);
        a.step(&reading(Zone::Pointer, None), at(33), &mut out);
        // Raw is already shut and steady; only the smoothed value is still falling.
        a.step(&lagging(Zone::Pointer, 0.2, 0.48), at(66), &mut out);
        a.step(&lagging(Zone::Pointer, 0.2, 0.31), at(100), &mut out);
        assert!(!a.state().voice_active);
    }

    #[test]
    fn rearm_waits_for_smoothed_ratio() {
        let mut a = arbiter();
        a.state_mut().pluck_armed = false;
        let mut out = Vec::new();
        a.step(&lagging(Zone::Pointer, 0.9, 0.4), at(0), &mut out);
        assert!(!a.state().pluck_armed);
        a.step(&lagging(Zone::Pointer, 0.9, 0.7), at(33), &mut out);
        assert!(a.state().pluck_armed);
    }

    #[test]
    fn missing_pinch_forgets_history() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pointer, Some(0.9)), at(0), &mut out);
        a.step(&reading(Zone::Pointer, None), at(33), &mut out);
        assert_eq!(a.state().previous_pinch, None);
        a.step(&reading(Zone::Pointer, Some(0.2)), at(66), &mut out);
        assert_eq!(a.state().phase, Phase::Hovering);
        assert_eq!(count(&out, |e| matches!(e, OutputEvent::NoteOn { .. })), 0);
    }

    #[test]
    fn hand_lost_forgets_history() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pointer, Some(0.9)), at(0), &mut out);
        a.hand_lost(&mut out);
        assert_eq!(a.state().previous_pinch, None);
        a.step(&reading(Zone::Pointer, Some(0.2)), at(300), &mut out);
        assert!(!a.state().voice_active);
    }

    #[test]
    fn pluck_ignores_pad_entry_until_released() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pointer, Some(0.9)), at(0), &mut out);
        a.step(&reading(Zone::Pointer, Some(0.3)), at(50), &mut out);
        a.step(&reading(Zone::Pad, Some(0.3)), at(100), &mut out);
        assert_eq!(a.state().phase, Phase::Pluck);
        assert_eq!(count(&out, |e| matches!(e, OutputEvent::NoteOn { .. })), 1);
    }

    #[test]
    fn force_release_without_voice_is_silent() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.force_release(ReleaseReason::StaleUpdate, 0.15, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn hide_cursor_only_on_transition() {
        let mut a = arbiter();
        let mut out = Vec::new();
        a.step(&reading(Zone::Pointer, None), at(0), &mut out);
        a.step(&reading(Zone::None, None), at(33), &mut out);
        a.step(&reading(Zone::None, None), at(66), &mut out);
        assert_eq!(count(&out, |e| *e == OutputEvent::HideCursor), 1);
    }
}
