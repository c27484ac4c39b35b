//! Live MIDI output over midir, with a null fallback.

use gesture_midi::{MidiSink, NullSink};
use midir::{MidiOutput, MidiOutputConnection};
use tracing::{info, warn};

// ── midir backend ─────────────────────────────────────────────────────────

pub struct MidirSink {
    conn:   MidiOutputConnection,
    port:   String,
    failed: bool,
}

impl MidiSink for MidirSink {
    fn send(&mut self, message: &[u8]) {
        match self.conn.send(message) {
            Ok(()) => self.failed = false,
            // Log the first failure of a run, not every frame of it.
            Err(e) if !self.failed => {
                warn!(port = %self.port, "MIDI send failed: {e}");
                self.failed = true;
            }
            Err(_) => {}
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// open_midi_output: enumerate ports and pick the best one
// ════════════════════════════════════════════════════════════════════════════

/// Index of the port to use: the first soft-synth-looking name, else 0.
pub fn pick_port<S: AsRef<str>>(names: &[S]) -> usize {
    names
        .iter()
        .position(|n| {
            let n = n.as_ref().to_lowercase();
            ["fluid", "timidity", "microsoft", "gm", "synth"].iter().any(|k| n.contains(k))
        })
        .unwrap_or(0)
}

/// Try to open a MIDI output port.  Falls back to a [`NullSink`] with a
/// warning if none can be opened, so the instrument still runs silently.
pub fn open_midi_output(client_name: &str) -> Box<dyn MidiSink> {
    let midi_out = match MidiOutput::new(client_name) {
        Ok(m)  => m,
        Err(e) => {
            warn!("MIDI init error: {e} — using null output");
            return Box::new(NullSink);
        }
    };

    let ports = midi_out.ports();
    if ports.is_empty() {
        warn!("no MIDI output ports found — using null output");
        warn!("install a synthesiser such as `fluidsynth` or `timidity -iA` (Linux); macOS and Windows ship one");
        return Box::new(NullSink);
    }

    let names: Vec<String> = ports
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect();
    let idx  = pick_port(&names);
    let port = names[idx].clone();
    info!(port = %port, "opening MIDI port");

    match midi_out.connect(&ports[idx], "theremin-out") {
        Ok(conn) => Box::new(MidirSink { conn, port, failed: false }),
        Err(e)   => {
            warn!("failed to connect to {port}: {e} — using null output");
            Box::new(NullSink)
        }
    }
}
