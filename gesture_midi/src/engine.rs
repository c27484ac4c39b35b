//! [`MidiSoundEngine`]: the interpreter's audio collaborator over MIDI.

use gesture_core::SoundEngine;
use tracing::{debug, info};

use crate::message::{self, *};
use crate::patch::Patch;
use crate::MidiSink;

// ════════════════════════════════════════════════════════════════════════════
// EngineConfig
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// MIDI channel 0–15.
    pub channel:    u8,
    /// Held note; X bends around it.
    pub root_note:  u8,
    /// Pitch-bend sensitivity (semitones each way).
    pub bend_range: u8,
    pub velocity:   u8,
    pub patch:      Patch,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            channel:    0,
            root_note:  60,
            bend_range: 24,
            velocity:   100,
            patch:      Patch::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiSoundEngine
// ════════════════════════════════════════════════════════════════════════════

/// Plays one voice on a MIDI channel.
///
/// Continuous controls are only re-sent when their 7-/14-bit value changes,
/// so a steady hand costs nothing on the wire.
pub struct MidiSoundEngine<S: MidiSink> {
    sink:      S,
    config:    EngineConfig,
    sounding:  Option<u8>,
    last_bend: Option<u16>,
    last_cc:   [Option<u8>; 128],
}

impl<S: MidiSink> MidiSoundEngine<S> {
    pub fn new(sink: S, config: EngineConfig) -> Self {
        MidiSoundEngine { sink, config, sounding: None, last_bend: None, last_cc: [None; 128] }
    }

    pub fn config(&self) -> &EngineConfig { &self.config }

    pub fn is_sounding(&self) -> bool { self.sounding.is_some() }

    pub fn sink(&self) -> &S { &self.sink }

    pub fn sink_mut(&mut self) -> &mut S { &mut self.sink }

    pub fn into_sink(self) -> S { self.sink }

    /// Program change, bend range and a centered bend.
    pub fn start(&mut self) {
        let ch = self.config.channel;
        info!(channel = ch, patch = self.config.patch.name(), bend_range = self.config.bend_range, "midi engine start");
        self.sink.send(&message::program_change(ch, self.config.patch.program()));
        for m in message::bend_range(ch, self.config.bend_range) {
            self.sink.send(&m);
        }
        self.bend(BEND_CENTER);
    }

    /// Switch program.  Takes effect on the next note.
    pub fn set_patch(&mut self, patch: Patch) {
        self.config.patch = patch;
        self.sink.send(&message::program_change(self.config.channel, patch.program()));
    }

    /// Silence the channel, whatever state it is in.
    pub fn all_notes_off(&mut self) {
        let ch = self.config.channel;
        if let Some(note) = self.sounding.take() {
            self.sink.send(&message::note_off(ch, note));
        }
        self.sink.send(&message::control_change(ch, CC_ALL_NOTES_OFF, 0));
        self.sink.send(&message::control_change(ch, CC_ALL_SOUND_OFF, 0));
        self.last_cc = [None; 128];
        self.bend(BEND_CENTER);
        debug!(channel = ch, "all notes off");
    }

    fn cc(&mut self, controller: u8, value: u8) {
        let slot = &mut self.last_cc[(controller & 0x7F) as usize];
        if *slot == Some(value) {
            return;
        }
        *slot = Some(value);
        self.sink.send(&message::control_change(self.config.channel, controller, value));
    }

    fn bend(&mut self, value: u16) {
        if self.last_bend == Some(value) {
            return;
        }
        self.last_bend = Some(value);
        self.sink.send(&message::pitch_bend(self.config.channel, value));
    }
}

impl<S: MidiSink> SoundEngine for MidiSoundEngine<S> {
    fn note_on(&mut self, attack_secs: f64) {
        if let Some(note) = self.sounding.take() {
            self.sink.send(&message::note_off(self.config.channel, note));
        }
        self.cc(CC_ATTACK, time_to_cc(attack_secs));
        let note = self.config.root_note;
        self.sink.send(&message::note_on(self.config.channel, note, self.config.velocity));
        self.sounding = Some(note);
        debug!(note, attack_secs, "note on");
    }

    fn note_update(&mut self, x: f64, y: f64) {
        self.bend(unit_to_bend(x));
        self.cc(CC_EXPRESSION, unit_to_7bit(y));
    }

    fn note_off(&mut self, release_secs: f64) {
        let Some(note) = self.sounding.take() else { return };
        self.cc(CC_RELEASE, time_to_cc(release_secs));
        self.sink.send(&message::note_off(self.config.channel, note));
        debug!(note, release_secs, "note off");
    }

    fn set_filter_resonance(&mut self, v: f64) { self.cc(CC_RESONANCE, unit_to_7bit(v)); }

    fn set_filter_cutoff_mod(&mut self, v: f64) { self.cc(CC_CUTOFF, unit_to_7bit(v)); }

    fn set_reverb(&mut self, wet: f64, dry: f64) {
        self.cc(CC_REVERB_SEND, unit_to_7bit(wet));
        self.cc(CC_VOLUME, unit_to_7bit(dry));
    }
}
