//! Safety supervisor: frame-loss counting and time-based watchdogs.
//!
//! Nothing here schedules anything.  Every check compares wall-clock samples
//! taken at call time, so a host that stops calling simply stops the checks.
//!
//! Checks run in a fixed order and only the first that fires is applied:
//! lost hand, pluck maximum duration, stuck voice, stale update.

use crate::arbiter::{GestureState, Phase, ReleaseReason};
use crate::config::{EnvelopeConfig, SafetyConfig};
use crate::frame::Timestamp;
use crate::zone::Zone;

/// A release the supervisor wants applied this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForcedRelease {
    pub reason:  ReleaseReason,
    pub release: f64,
}

#[derive(Clone, Debug)]
pub struct SafetySupervisor {
    config: SafetyConfig,
}

impl SafetySupervisor {
    pub fn new(config: SafetyConfig) -> Self { SafetySupervisor { config } }

    pub fn config(&self) -> &SafetyConfig { &self.config }

    /// Per-frame bookkeeping: the lost-hand counter and the time the voice
    /// left the pad zone.  Call after the arbiter step.
    pub fn observe_frame(&self, state: &mut GestureState, sound_present: bool, zone: Zone, now: Timestamp) {
        if sound_present {
            state.lost_frames = 0;
        } else {
            state.lost_frames = state.lost_frames.saturating_add(1);
        }

        if state.voice_active && zone != Zone::Pad {
            state.outside_pad_since.get_or_insert(now);
        } else {
            state.outside_pad_since = None;
        }
    }

    /// True on exactly the frame the lost-hand counter reaches its threshold.
    pub fn hand_just_lost(&self, state: &GestureState) -> bool {
        state.lost_frames == self.config.lost_frame_threshold
    }

    /// The first safety condition that applies to the active voice, if any.
    pub fn check(&self, state: &GestureState, envelope: &EnvelopeConfig, now: Timestamp) -> Option<ForcedRelease> {
        if !state.voice_active {
            return None;
        }
        let forced = |reason| ForcedRelease { reason, release: envelope.default_release };
        let elapsed = |since: Option<Timestamp>| since.map(|t| now.since(t));

        if state.lost_frames >= self.config.lost_frame_threshold {
            return Some(forced(ReleaseReason::LostHand));
        }
        if state.phase == Phase::Pluck
            && elapsed(state.gesture_started).is_some_and(|s| s >= self.config.pluck_max_duration)
        {
            return Some(ForcedRelease { reason: ReleaseReason::PluckElapsed, release: envelope.pluck_release });
        }
        if elapsed(state.outside_pad_since).is_some_and(|s| s >= self.config.stuck_voice_timeout) {
            return Some(forced(ReleaseReason::StuckVoice));
        }
        if elapsed(state.last_update).is_some_and(|s| s >= self.config.stale_update_timeout) {
            return Some(forced(ReleaseReason::StaleUpdate));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active(phase: Phase, started: f64) -> GestureState {
        GestureState {
            phase,
            voice_active:    true,
            gesture_started: Some(Timestamp::from_secs(started)),
            last_update:     Some(Timestamp::from_secs(started)),
            ..GestureState::default()
        }
    }

    fn supervisor() -> SafetySupervisor { SafetySupervisor::new(SafetyConfig::default()) }

    #[test]
    fn idle_never_forced() {
        let s = supervisor();
        let mut state = GestureState::default();
        state.lost_frames = 100;
        assert_eq!(s.check(&state, &EnvelopeConfig::default(), Timestamp::from_secs(99.0)), None);
    }

    #[test]
    fn lost_counter_resets_on_observation() {
        let s = supervisor();
        let mut state = GestureState::default();
        let t = Timestamp::ZERO;
        s.observe_frame(&mut state, false, Zone::None, t);
        s.observe_frame(&mut state, false, Zone::None, t);
        assert_eq!(state.lost_frames, 2);
        s.observe_frame(&mut state, true, Zone::None, t);
        assert_eq!(state.lost_frames, 0);
    }

    #[test]
    fn lost_hand_uses_default_release() {
        let s = supervisor();
        let env = EnvelopeConfig::default();
        let mut state = active(Phase::Pad, 0.0);
        state.lost_frames = s.config().lost_frame_threshold;
        assert_eq!(
            s.check(&state, &env, Timestamp::from_secs(0.1)),
            Some(ForcedRelease { reason: ReleaseReason::LostHand, release: env.default_release })
        );
    }

    #[test]
    fn pluck_cap_uses_pluck_release() {
        let s = supervisor();
        let env = EnvelopeConfig::default();
        let state = active(Phase::Pluck, 1.0);
        assert_eq!(s.check(&state, &env, Timestamp::from_secs(1.2)), None);
        assert_eq!(
            s.check(&state, &env, Timestamp::from_secs(1.45)),
            Some(ForcedRelease { reason: ReleaseReason::PluckElapsed, release: env.pluck_release })
        );
    }

    #[test]
    fn pluck_cap_wins_over_stuck_voice() {
        let s = supervisor();
        let env = EnvelopeConfig::default();
        let mut state = active(Phase::Pluck, 0.0);
        state.outside_pad_since = Some(Timestamp::ZERO);
        let hit = s.check(&state, &env, Timestamp::from_secs(5.0)).unwrap();
        assert_eq!(hit.reason, ReleaseReason::PluckElapsed);
    }

    #[test]
    fn stuck_voice_outside_pad() {
        let s = supervisor();
        let mut state = active(Phase::Pad, 0.0);
        s.observe_frame(&mut state, true, Zone::Pointer, Timestamp::from_secs(0.5));
        state.last_update = Some(Timestamp::from_secs(2.4));
        let hit = s.check(&state, &EnvelopeConfig::default(), Timestamp::from_secs(2.5)).unwrap();
        assert_eq!(hit.reason, ReleaseReason::StuckVoice);
    }

    #[test]
    fn returning_to_pad_clears_stuck_timer() {
        let s = supervisor();
        let mut state = active(Phase::Pad, 0.0);
        s.observe_frame(&mut state, true, Zone::Pointer, Timestamp::from_secs(0.5));
        assert!(state.outside_pad_since.is_some());
        s.observe_frame(&mut state, true, Zone::Pad, Timestamp::from_secs(0.6));
        assert_eq!(state.outside_pad_since, None);
    }

    #[test]
    fn stale_update() {
        let s = supervisor();
        let env = EnvelopeConfig::default();
        let state = active(Phase::Pad, 0.0);
        assert_eq!(s.check(&state, &env, Timestamp::from_secs(0.9)), None);
        let hit = s.check(&state, &env, Timestamp::from_secs(1.0)).unwrap();
        assert_eq!(hit, ForcedRelease { reason: ReleaseReason::StaleUpdate, release: env.default_release });
    }
}
