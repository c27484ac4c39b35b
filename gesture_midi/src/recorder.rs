//! Performance capture to a Standard MIDI File (Type 0, single track).

use std::io::Write;
use std::time::Instant;

use tracing::info;

use crate::MidiSink;

// ════════════════════════════════════════════════════════════════════════════
// Recorder: timestamped messages before serialisation
// ════════════════════════════════════════════════════════════════════════════

/// Accumulates channel messages against a seconds clock.
pub struct Recorder {
    events:            Vec<(f64, Vec<u8>)>,
    pub ticks_per_quarter: u16,
    pub tempo_bpm:         u32,
    /// Track name meta-event.
    pub description:       String,
}

impl Default for Recorder {
    fn default() -> Self {
        Recorder {
            events:            Vec::new(),
            ticks_per_quarter: 480,
            tempo_bpm:         120,
            description:       String::from("gesture performance"),
        }
    }
}

impl Recorder {
    pub fn new() -> Self { Self::default() }

    /// Store `message` at `at_secs` from the start of the take.  Out-of-order
    /// stamps are pulled forward to the previous event's time.
    pub fn record(&mut self, at_secs: f64, message: &[u8]) {
        let floor = self.events.last().map_or(0.0, |(t, _)| *t);
        let at = if at_secs.is_finite() { at_secs.max(floor) } else { floor };
        self.events.push((at, message.to_vec()));
    }

    pub fn len(&self) -> usize { self.events.len() }

    /// Recorded messages, oldest first.
    pub fn messages(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.events.iter().map(|(_, m)| m.as_slice())
    }

    pub fn is_empty(&self) -> bool { self.events.is_empty() }

    /// Length of the take in seconds.
    pub fn duration_secs(&self) -> f64 { self.events.last().map_or(0.0, |(t, _)| *t) }

    fn secs_to_ticks(&self, secs: f64) -> u32 {
        let per_sec = self.ticks_per_quarter as f64 * self.tempo_bpm as f64 / 60.0;
        (secs * per_sec).round().clamp(0.0, u32::MAX as f64) as u32
    }

    /// Serialise to a `Vec<u8>` containing a valid MIDI Type-0 file.
    pub fn to_bytes(&self) -> Vec<u8> {
        let track = self.build_track_chunk();

        let mut out = Vec::with_capacity(track.len() + 22);
        out.extend_from_slice(b"MThd");
        out.extend_from_slice(&6u32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // format 0
        out.extend_from_slice(&1u16.to_be_bytes()); // 1 track
        out.extend_from_slice(&self.ticks_per_quarter.to_be_bytes());

        out.extend_from_slice(b"MTrk");
        out.extend_from_slice(&(track.len() as u32).to_be_bytes());
        out.extend_from_slice(&track);
        out
    }

    /// Serialise and write to `path`.
    pub fn write_file(&self, path: &str) -> std::io::Result<()> {
        let bytes = self.to_bytes();
        let mut f = std::fs::File::create(path)?;
        f.write_all(&bytes)?;
        info!(path, events = self.events.len(), secs = self.duration_secs(), "performance written");
        Ok(())
    }

    fn build_track_chunk(&self) -> Vec<u8> {
        let mut t: Vec<u8> = Vec::new();

        // ── Tempo meta-event ──────────────────────────────────────────────
        let micros = 60_000_000u32 / self.tempo_bpm.max(1);
        t.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03]);
        t.extend_from_slice(&micros.to_be_bytes()[1..]);

        // ── Track name ────────────────────────────────────────────────────
        let name = self.description.as_bytes();
        t.extend_from_slice(&[0x00, 0xFF, 0x03]);
        write_vlq(&mut t, name.len() as u32);
        t.extend_from_slice(name);

        // ── Channel messages ──────────────────────────────────────────────
        let mut last_tick = 0u32;
        for (at, msg) in &self.events {
            let tick = self.secs_to_ticks(*at).max(last_tick);
            write_vlq(&mut t, tick - last_tick);
            t.extend_from_slice(msg);
            last_tick = tick;
        }

        // ── End of track ──────────────────────────────────────────────────
        t.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);
        t
    }
}

/// Write a MIDI variable-length quantity (VLQ).
fn write_vlq(buf: &mut Vec<u8>, mut value: u32) {
    let mut bytes = [0u8; 5];
    let mut i = bytes.len() - 1;
    bytes[i] = (value & 0x7F) as u8;
    value >>= 7;
    while value > 0 {
        i -= 1;
        bytes[i] = ((value & 0x7F) | 0x80) as u8;
        value >>= 7;
    }
    buf.extend_from_slice(&bytes[i..]);
}

// ════════════════════════════════════════════════════════════════════════════
// Recording: a sink that forwards and records
// ════════════════════════════════════════════════════════════════════════════

/// Passes every message to `inner` and stamps a copy into a [`Recorder`]
/// against wall-clock time since construction.
pub struct Recording<S: MidiSink> {
    inner:    S,
    recorder: Recorder,
    started:  Instant,
}

impl<S: MidiSink> Recording<S> {
    pub fn new(inner: S) -> Self {
        Recording { inner, recorder: Recorder::new(), started: Instant::now() }
    }

    pub fn recorder(&self) -> &Recorder { &self.recorder }

    pub fn into_parts(self) -> (S, Recorder) { (self.inner, self.recorder) }
}

impl<S: MidiSink> MidiSink for Recording<S> {
    fn send(&mut self, message: &[u8]) {
        self.inner.send(message);
        self.recorder.record(self.started.elapsed().as_secs_f64(), message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vlq_single_byte() {
        let mut b = Vec::new();
        write_vlq(&mut b, 0x40);
        assert_eq!(b, [0x40]);
    }

    #[test]
    fn vlq_multi_byte() {
        let mut b = Vec::new();
        write_vlq(&mut b, 128);
        assert_eq!(b, [0x81, 0x00]);
        b.clear();
        write_vlq(&mut b, 0x0FFF_FFFF);
        assert_eq!(b, [0xFF, 0xFF, 0xFF, 0x7F]);
    }

    #[test]
    fn header_is_type_zero_single_track() {
        let bytes = Recorder::new().to_bytes();
        assert_eq!(&bytes[0..4], b"MThd");
        assert_eq!(&bytes[8..10], &[0, 0]);
        assert_eq!(&bytes[10..12], &[0, 1]);
        assert_eq!(&bytes[12..14], &480u16.to_be_bytes());
        assert_eq!(&bytes[14..18], b"MTrk");
    }

    #[test]
    fn ends_with_end_of_track() {
        let mut r = Recorder::new();
        r.record(0.0, &[0x90, 60, 100]);
        let bytes = r.to_bytes();
        assert_eq!(&bytes[bytes.len() - 3..], &[0xFF, 0x2F, 0x00]);
    }

    #[test]
    fn track_length_matches_chunk() {
        let mut r = Recorder::new();
        r.record(0.0, &[0x90, 60, 100]);
        r.record(1.0, &[0x80, 60, 0]);
        let bytes = r.to_bytes();
        let len = u32::from_be_bytes([bytes[18], bytes[19], bytes[20], bytes[21]]) as usize;
        assert_eq!(bytes.len(), 22 + len);
    }

    #[test]
    fn deltas_follow_wall_clock() {
        // 120 bpm × 480 tpq → 960 ticks per second.
        let mut r = Recorder::new();
        r.record(0.0, &[0x90, 60, 100]);
        r.record(0.5, &[0x80, 60, 0]);
        let bytes = r.to_bytes();
        let eot = bytes.len() - 4;
        // …, delta 480 = [0x83, 0x60], note off, EOT
        assert_eq!(&bytes[eot - 5..eot], &[0x83, 0x60, 0x80, 60, 0]);
    }

    #[test]
    fn out_of_order_stamps_are_clamped() {
        let mut r = Recorder::new();
        r.record(1.0, &[0x90, 60, 100]);
        r.record(0.5, &[0x80, 60, 0]);
        assert_eq!(r.duration_secs(), 1.0);
    }

    #[test]
    fn recording_forwards_and_keeps_a_copy() {
        let mut rec = Recording::new(Vec::<Vec<u8>>::new());
        rec.send(&[0xB0, 74, 10]);
        rec.send(&[0xB0, 74, 20]);
        let (inner, recorder) = rec.into_parts();
        assert_eq!(inner.len(), 2);
        assert_eq!(recorder.len(), 2);
    }
}
