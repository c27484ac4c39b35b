//! Top-level application state.
//!
//! `AppState` owns the interpreter, the MIDI engine and the cursor layer.  It
//! feeds each tracking frame through the interpreter and routes the result;
//! `run` drives it from the window loop.

use std::sync::mpsc::{self, TryRecvError};
use std::time::Instant;

use gesture_core::{
    dispatch, GestureInterpreter, InterpreterConfig, LandmarkFrame, OutputEvent, Phase, Timestamp, Zone,
};
use gesture_midi::{EngineConfig, MidiSink, MidiSoundEngine, Patch, Recording};
use tracing::{info, warn};

use crate::cursor::CursorLayer;
use crate::error::AppError;
use crate::midi_out::open_midi_output;
use crate::source::{spawn_hand_source, HandEvent, SimInput};
use crate::visualizer::{UiAction, Visualizer};

// ════════════════════════════════════════════════════════════════════════════
// AppConfig
// ════════════════════════════════════════════════════════════════════════════

pub const USAGE: &str = "\
usage: leap_theremin [--depth-sensor] [--sticky-roles] [--record <file.mid>] [--channel <1-16>]";

/// Configuration for the full application.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AppConfig {
    pub interpreter: InterpreterConfig,
    pub engine:      EngineConfig,
    /// Write the performance here as a Standard MIDI File on exit.
    pub record_path: Option<String>,
}

impl AppConfig {
    /// Parse command-line flags (without the program name).
    pub fn from_args<I>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut cfg = AppConfig::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--depth-sensor" => {
                    let sticky = cfg.interpreter.roles.sticky_roles;
                    cfg.interpreter = InterpreterConfig::depth_sensor();
                    cfg.interpreter.roles.sticky_roles = sticky;
                }
                "--sticky-roles" => cfg.interpreter.roles.sticky_roles = true,
                "--record" => {
                    let path = args.next().ok_or_else(|| AppError::Args("--record needs a file name".into()))?;
                    cfg.record_path = Some(path);
                }
                "--channel" => {
                    let n: u8 = args
                        .next()
                        .and_then(|s| s.parse().ok())
                        .filter(|n| (1..=16).contains(n))
                        .ok_or_else(|| AppError::Args("--channel needs a number 1–16".into()))?;
                    cfg.engine.channel = n - 1;
                }
                other => return Err(AppError::Args(format!("unknown argument `{other}`\n{USAGE}"))),
            }
        }
        Ok(cfg)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ControlLevels: last continuous values, for display
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ControlLevels {
    pub resonance: f64,
    pub cutoff:    f64,
    pub wet:       f64,
}

impl ControlLevels {
    fn absorb(&mut self, events: &[OutputEvent]) {
        for e in events {
            match *e {
                OutputEvent::FilterResonance(v) => self.resonance = v,
                OutputEvent::FilterCutoffMod(v) => self.cutoff = v,
                OutputEvent::Reverb { wet, .. } => self.wet = wet,
                _ => {}
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// AppState
// ════════════════════════════════════════════════════════════════════════════

pub struct AppState {
    interpreter: GestureInterpreter,
    engine:      MidiSoundEngine<Recording<Box<dyn MidiSink>>>,
    cursor:      CursorLayer,
    levels:      ControlLevels,
    record_path: Option<String>,
    /// Zero point of the interpreter's clock.
    epoch:       Instant,
    hands:       usize,
    pub status:  String,
}

impl AppState {
    pub fn new(cfg: AppConfig, sink: Box<dyn MidiSink>) -> Result<Self, AppError> {
        let interpreter = GestureInterpreter::new(cfg.interpreter)?;
        let mut engine = MidiSoundEngine::new(Recording::new(sink), cfg.engine);
        engine.start();

        Ok(AppState {
            interpreter,
            engine,
            cursor:      CursorLayer::default(),
            levels:      ControlLevels::default(),
            record_path: cfg.record_path,
            epoch:       Instant::now(),
            hands:       0,
            status:      String::from("Ready: bring a hand into view"),
        })
    }

    fn stamp(&self, at: Instant) -> Timestamp {
        Timestamp::from(at.saturating_duration_since(self.epoch))
    }

    // ── per frame ─────────────────────────────────────────────────────────

    /// Run one tracking frame through the interpreter and route the result.
    pub fn handle_frame(&mut self, frame: &LandmarkFrame, captured: Instant) {
        let events = self.interpreter.update(frame, self.stamp(captured));
        self.hands = frame.hands.len();
        self.route(&events);
    }

    /// Time-only safety checks for ticks where no frame arrived.
    pub fn watchdog(&mut self, now: Instant) {
        let events = self.interpreter.check_watchdogs(self.stamp(now));
        self.route(&events);
    }

    fn route(&mut self, events: &[OutputEvent]) {
        dispatch(events, &mut self.engine, &mut self.cursor);
        self.levels.absorb(events);
        self.status = format!(
            "{:<8} zone={:<7} hands={}  res={:.2} cut={:.2} wet={:.2}  {}",
            format!("{:?}", self.interpreter.phase()),
            self.interpreter.zone().name(),
            self.hands,
            self.levels.resonance,
            self.levels.cutoff,
            self.levels.wet,
            self.engine.config().patch.name(),
        );
    }

    /// Animate between frames.
    pub fn tick(&mut self, dt: f32) { self.cursor.tick(dt); }

    pub fn next_patch(&mut self) {
        let patch = self.engine.config().patch.next();
        self.engine.set_patch(patch);
        info!(patch = patch.name(), "patch changed");
    }

    /// Release everything, silence the channel and write the recording.
    pub fn shutdown(&mut self) -> Result<(), AppError> {
        let events = self.interpreter.shutdown();
        self.route(&events);
        self.engine.all_notes_off();

        if let Some(path) = &self.record_path {
            self.engine.sink().recorder().write_file(path)?;
        }
        Ok(())
    }

    // ── Accessors for the render loop ─────────────────────────────────────

    pub fn cursor(&self) -> &CursorLayer       { &self.cursor }
    pub fn levels(&self) -> ControlLevels      { self.levels }
    pub fn phase(&self)  -> Phase              { self.interpreter.phase() }
    pub fn zone(&self)   -> Zone               { self.interpreter.zone() }
    pub fn patch(&self)  -> Patch              { self.engine.config().patch }
    pub fn config(&self) -> &InterpreterConfig { self.interpreter.config() }
}

// ════════════════════════════════════════════════════════════════════════════
// run(): the main application loop
// ════════════════════════════════════════════════════════════════════════════

/// Run the full application.
///
/// Creates the window, the hand source (simulation by default, hardware with
/// `--features leap`) and the MIDI output, then drives the frame loop at
/// ~60 fps until the window closes or the source goes away.
pub fn run(cfg: AppConfig) -> Result<(), AppError> {
    let (sim_tx, sim_rx) = mpsc::channel::<SimInput>();

    #[cfg(not(feature = "leap"))]
    let hand_rx = spawn_hand_source(crate::source::SimHandSource { rx: sim_rx });
    #[cfg(feature = "leap")]
    let hand_rx = {
        drop(sim_rx);
        spawn_hand_source(crate::source::LeapHandSource)
    };

    let mut vis = Visualizer::new(sim_tx, cfg.interpreter.zone.active_mapping_scale)?;
    let mut app = AppState::new(cfg, open_midi_output("leap_theremin"))?;
    let mut last_tick = Instant::now();

    'frames: while vis.is_open() {
        match vis.poll_input() {
            UiAction::Quit      => break,
            UiAction::NextPatch => app.next_patch(),
            UiAction::Continue  => {}
        }

        let mut got_frame = false;
        loop {
            match hand_rx.try_recv() {
                Ok(HandEvent::Frame { frame, captured }) => {
                    app.handle_frame(&frame, captured);
                    got_frame = true;
                }
                Ok(HandEvent::Closed) | Err(TryRecvError::Disconnected) => {
                    warn!("hand source closed");
                    break 'frames;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        let now = Instant::now();
        if !got_frame {
            app.watchdog(now);
        }
        app.tick(now.duration_since(last_tick).as_secs_f32());
        last_tick = now;

        vis.render(&app);
    }

    app.shutdown()
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gesture_core::HandObservation;
    use gesture_midi::NullSink;

    use super::*;
    use crate::source::SimControls;

    fn args(list: &[&str]) -> Vec<String> { list.iter().map(|s| s.to_string()).collect() }

    fn make_app() -> AppState {
        AppState::new(AppConfig::default(), Box::new(NullSink)).unwrap()
    }

    fn note_ons(app: &AppState) -> usize {
        app.engine.sink().recorder().messages().filter(|m| m[0] & 0xF0 == 0x90).count()
    }

    #[test]
    fn default_args() {
        assert_eq!(AppConfig::from_args(args(&[])).unwrap(), AppConfig::default());
    }

    #[test]
    fn flags_parse() {
        let cfg = AppConfig::from_args(args(&["--sticky-roles", "--depth-sensor", "--channel", "10", "--record", "take.mid"]))
            .unwrap();
        assert!(cfg.interpreter.roles.sticky_roles);
        assert_eq!(cfg.interpreter.safety.lost_frame_threshold, 12);
        assert_eq!(cfg.engine.channel, 9);
        assert_eq!(cfg.record_path.as_deref(), Some("take.mid"));
    }

    #[test]
    fn bad_args_rejected() {
        assert!(matches!(AppConfig::from_args(args(&["--channel", "0"])), Err(AppError::Args(_))));
        assert!(matches!(AppConfig::from_args(args(&["--record"])), Err(AppError::Args(_))));
        assert!(matches!(AppConfig::from_args(args(&["--loud"])), Err(AppError::Args(_))));
    }

    #[test]
    fn invalid_interpreter_config_fails_construction() {
        let mut cfg = AppConfig::default();
        cfg.interpreter.zone.pad_exit_m = 0.1;
        assert!(matches!(AppState::new(cfg, Box::new(NullSink)), Err(AppError::Config(_))));
    }

    #[test]
    fn pad_gesture_plays_a_note() {
        let mut app = make_app();
        let t0 = Instant::now();
        let hand = HandObservation::at(0.5, 0.5).with_depth(0.2);
        app.handle_frame(&LandmarkFrame::new(vec![hand]), t0);
        assert_eq!(app.phase(), Phase::Pad);
        assert_eq!(note_ons(&app), 1);
        assert!(app.cursor().cursor.is_some());
        assert_eq!(app.cursor().ripples.len(), 1);
    }

    #[test]
    fn simulated_pinch_plucks() {
        let mut app = make_app();
        let controls = SimControls::default();
        let t0 = Instant::now();
        for i in 0..4 {
            let pinched = i >= 2;
            let frame = controls.sample((0.6, 0.5), pinched).to_frame();
            app.handle_frame(&frame, t0 + Duration::from_millis(16 * i));
        }
        assert_eq!(app.phase(), Phase::Pluck);
        assert_eq!(note_ons(&app), 1);
    }

    #[test]
    fn watchdog_releases_abandoned_voice() {
        let mut app = make_app();
        let t0 = Instant::now();
        app.handle_frame(&LandmarkFrame::new(vec![HandObservation::at(0.5, 0.5).with_depth(0.2)]), t0);
        app.watchdog(t0 + Duration::from_secs(5));
        assert_eq!(app.phase(), Phase::Idle);
    }

    #[test]
    fn filter_levels_are_tracked() {
        let mut app = make_app();
        let frame = SimControls::default().sample((0.5, 0.5), false).to_frame();
        app.handle_frame(&frame, Instant::now());
        let levels = app.levels();
        assert!((levels.resonance - 0.5).abs() < 1e-9);
        assert!((levels.cutoff - 0.5).abs() < 1e-9);
        assert!(levels.wet > 0.0);
    }

    #[test]
    fn shutdown_silences_channel() {
        let mut app = make_app();
        app.handle_frame(&LandmarkFrame::new(vec![HandObservation::at(0.5, 0.5).with_depth(0.2)]), Instant::now());
        app.shutdown().unwrap();
        assert_eq!(app.phase(), Phase::Idle);
        let last_off = app.engine.sink().recorder().messages().any(|m| m == [0xB0, 123, 0]);
        assert!(last_off);
    }

    #[test]
    fn next_patch_cycles() {
        let mut app = make_app();
        let before = app.patch();
        app.next_patch();
        assert_eq!(app.patch(), before.next());
    }
}
