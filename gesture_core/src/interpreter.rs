//! The per-frame interpreter: roles → smoothing → zone → arbiter → safety.
//!
//! [`GestureInterpreter::update`] is the only entry point a frame loop needs.
//! It never fails and never blocks; everything it wants done is returned as an
//! ordered batch of [`OutputEvent`]s.

use tracing::{debug, info};

use crate::arbiter::{Arbiter, Phase, PinchReading, ReleaseReason, SoundReading};
use crate::config::InterpreterConfig;
use crate::error::ConfigError;
use crate::frame::{HandObservation, LandmarkFrame, Timestamp};
use crate::output::{map_to_surface, OutputEvent};
use crate::roles::RoleAssigner;
use crate::safety::SafetySupervisor;
use crate::smoothing::SmoothingState;
use crate::zone::{classify, hand_depth, Zone};

pub struct GestureInterpreter {
    config:  InterpreterConfig,
    filter:  SmoothingState,
    sound:   SmoothingState,
    zone:    Zone,
    arbiter: Arbiter,
    safety:  SafetySupervisor,
    roles:   RoleAssigner,
}

impl GestureInterpreter {
    pub fn new(config: InterpreterConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            pad_enter = config.zone.pad_enter_m,
            pointer_max = config.zone.pointer_max_m,
            sticky_roles = config.roles.sticky_roles,
            "gesture interpreter ready"
        );
        Ok(GestureInterpreter {
            filter:  SmoothingState::new(),
            sound:   SmoothingState::new(),
            zone:    Zone::None,
            arbiter: Arbiter::new(config.pinch.clone(), config.envelope.clone()),
            safety:  SafetySupervisor::new(config.safety.clone()),
            roles:   RoleAssigner::new(config.roles.sticky_roles),
            config,
        })
    }

    // ── accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &InterpreterConfig { &self.config }

    pub fn phase(&self) -> Phase { self.arbiter.state().phase }

    pub fn zone(&self) -> Zone { self.zone }

    pub fn is_voice_active(&self) -> bool { self.arbiter.state().voice_active }

    /// Smoothed filter-hand palm position, once the filter hand has been seen.
    pub fn filter_position(&self) -> Option<(f64, f64)> { self.filter.x.zip(self.filter.y) }

    // ── per frame ─────────────────────────────────────────────────────────

    /// Process one observation cycle.
    pub fn update(&mut self, frame: &LandmarkFrame, now: Timestamp) -> Vec<OutputEvent> {
        let mut out = Vec::new();
        let roles = self.roles.assign(&frame.hands);

        if let Some(i) = roles.filter {
            self.drive_filter(&frame.hands[i], frame, &mut out);
        }

        let sound = roles.sound.map(|i| &frame.hands[i]);
        if let Some(hand) = sound {
            let reading = self.read_sound(hand, frame, now);
            self.arbiter.step(&reading, now, &mut out);
        } else {
            self.arbiter.forget_pinch();
        }

        let state = self.arbiter.state_mut();
        self.safety.observe_frame(state, sound.is_some(), self.zone, now);
        self.apply_safety(now, &mut out);

        if sound.is_none() && self.safety.hand_just_lost(self.arbiter.state()) {
            debug!(frames = self.config.safety.lost_frame_threshold, "sound hand lost");
            self.arbiter.hand_lost(&mut out);
            self.zone = Zone::None;
            self.sound.reset();
        }
        out
    }

    /// Run only the time-based safety checks.  For hosts whose tracker has
    /// stopped delivering frames altogether.
    pub fn check_watchdogs(&mut self, now: Timestamp) -> Vec<OutputEvent> {
        let mut out = Vec::new();
        self.apply_safety(now, &mut out);
        out
    }

    /// Force any voice off, hide the cursor and forget all smoothed state.
    pub fn shutdown(&mut self) -> Vec<OutputEvent> {
        let mut out = Vec::new();
        let release = self.config.envelope.default_release;
        self.arbiter.force_release(ReleaseReason::Shutdown, release, &mut out);
        self.arbiter.hand_lost(&mut out);

        self.arbiter.reset();
        self.filter.reset();
        self.sound.reset();
        self.roles.reset();
        self.zone = Zone::None;
        info!("gesture interpreter shut down");
        out
    }

    /// Swap the configuration.  Refused while a voice is sounding.
    pub fn set_config(&mut self, config: InterpreterConfig) -> Result<(), ConfigError> {
        if self.is_voice_active() {
            return Err(ConfigError::GestureInProgress);
        }
        config.validate()?;

        self.arbiter.reconfigure(config.pinch.clone(), config.envelope.clone());
        self.safety = SafetySupervisor::new(config.safety.clone());
        if config.roles.sticky_roles != self.config.roles.sticky_roles {
            self.roles = RoleAssigner::new(config.roles.sticky_roles);
        }
        self.config = config;
        info!("configuration updated");
        Ok(())
    }

    // ── internals ─────────────────────────────────────────────────────────

    fn apply_safety(&mut self, now: Timestamp, out: &mut Vec<OutputEvent>) {
        if let Some(forced) = self.safety.check(self.arbiter.state(), self.arbiter.envelope(), now) {
            self.arbiter.force_release(forced.reason, forced.release, out);
        }
    }

    /// Filter-hand controls.  These run every frame the hand is seen,
    /// independent of the arbiter's phase.
    fn drive_filter(&mut self, hand: &HandObservation, frame: &LandmarkFrame, out: &mut Vec<OutputEvent>) {
        let s = &self.config.smoothing;
        let scale = self.config.zone.active_mapping_scale;

        let (_, y) = self.filter.observe_position(hand.palm.x, hand.palm.y, s.position_alpha);
        let height = 1.0 - map_to_surface(y, scale);
        let resonance = self.filter.observe_resonance(height, s.resonance_alpha);
        out.push(OutputEvent::FilterResonance(resonance.clamp(0.0, 1.0)));

        if let Some(facing) = hand.palm_facing {
            let cutoff = self.filter.observe_palm_facing(facing, s.palm_facing_alpha);
            out.push(OutputEvent::FilterCutoffMod(cutoff.clamp(0.0, 1.0)));
        }

        if let Some(ratio) = hand.pinch_ratio(frame.width_px, frame.height_px) {
            let p = &self.config.pinch;
            let openness = ((ratio - p.openness_min) / (p.openness_max - p.openness_min)).clamp(0.0, 1.0);
            let openness = self.filter.observe_reverb(openness, s.reverb_alpha);
            let (wet, dry) = reverb_levels(openness, self.config.reverb.max_wet, self.config.reverb.enable_epsilon);
            out.push(OutputEvent::Reverb { wet, dry });
        }
    }

    fn read_sound(&mut self, hand: &HandObservation, frame: &LandmarkFrame, now: Timestamp) -> SoundReading {
        let s = &self.config.smoothing;
        let scale = self.config.zone.active_mapping_scale;

        let (x, y) = self.sound.observe_position(hand.palm.x, hand.palm.y, s.position_alpha);
        let surface = (map_to_surface(x, scale), map_to_surface(y, scale));

        let pinch = hand
            .pinch_ratio(frame.width_px, frame.height_px)
            .map(|raw| PinchReading { raw, smoothed: self.sound.observe_pinch(raw, s.pinch_alpha) });

        let motion = hand_depth(hand, frame.width_px, frame.height_px, &self.config.zone)
            .map(|d| self.sound.observe_depth(d, now, s.depth_alpha, s.velocity_alpha));

        let zone = classify(self.zone, motion.map(|m| m.depth), &self.config.zone);
        if zone != self.zone {
            debug!(from = self.zone.name(), to = zone.name(), depth = ?motion.map(|m| m.depth), "zone change");
            self.zone = zone;
        }

        SoundReading { surface, zone, pinch, motion }
    }
}

/// Wet level from smoothed openness: `openness²` capped at `max_wet`.  Below
/// `epsilon` the wet channel is off and the dry path runs at unity.
pub fn reverb_levels(openness: f64, max_wet: f64, epsilon: f64) -> (f64, f64) {
    let wet = (openness * openness).clamp(0.0, max_wet);
    if wet > epsilon { (wet, 1.0 - wet) } else { (0.0, 1.0) }
}
