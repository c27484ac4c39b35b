//! Output adapter: the events the interpreter emits and the two collaborator
//! interfaces they are routed to.
//!
//! The interpreter itself only produces [`OutputEvent`]s.  A host hands each
//! frame's batch to [`dispatch`], which calls the audio engine and the cursor
//! view in order.

// ════════════════════════════════════════════════════════════════════════════
// OutputEvent
// ════════════════════════════════════════════════════════════════════════════

/// Everything the interpreter can ask of its collaborators.
#[derive(Clone, Debug, PartialEq)]
pub enum OutputEvent {
    /// Start the voice with the given attack (seconds).
    NoteOn { attack: f64 },
    /// Move the voice.  Both axes in [0, 1]; `y` is height (1 = top).
    NoteUpdate { x: f64, y: f64 },
    /// Release the voice with the given release (seconds).
    NoteOff { release: f64 },
    /// [0, 1]
    FilterResonance(f64),
    /// [0, 1]
    FilterCutoffMod(f64),
    /// Wet level and its dry complement.
    Reverb { wet: f64, dry: f64 },
    /// Screen-space cursor (y down).  `hovering` distinguishes the hover
    /// cursor from the active one.
    ShowCursor { x: f64, y: f64, hovering: bool },
    HideCursor,
    /// One-shot ripple at a zone entry or pluck.
    Pulse { x: f64, y: f64 },
}

// ════════════════════════════════════════════════════════════════════════════
// Collaborator traits
// ════════════════════════════════════════════════════════════════════════════

/// Sound-producing collaborator.
pub trait SoundEngine {
    fn note_on(&mut self, attack_secs: f64);
    fn note_update(&mut self, x: f64, y: f64);
    fn note_off(&mut self, release_secs: f64);
    fn set_filter_resonance(&mut self, v: f64);
    fn set_filter_cutoff_mod(&mut self, v: f64);
    fn set_reverb(&mut self, wet: f64, dry: f64);
}

/// On-screen cursor/ripple collaborator.  Purely visual.
pub trait CursorView {
    fn show_cursor(&mut self, x: f64, y: f64, hovering: bool);
    fn hide_cursor(&mut self);
    fn pulse(&mut self, x: f64, y: f64);
}

/// Route a batch of events to the collaborators, preserving order.
pub fn dispatch<S, C>(events: &[OutputEvent], sound: &mut S, cursor: &mut C)
where
    S: SoundEngine + ?Sized,
    C: CursorView + ?Sized,
{
    for event in events {
        match *event {
            OutputEvent::NoteOn { attack }          => sound.note_on(attack),
            OutputEvent::NoteUpdate { x, y }        => sound.note_update(x, y),
            OutputEvent::NoteOff { release }        => sound.note_off(release),
            OutputEvent::FilterResonance(v)         => sound.set_filter_resonance(v),
            OutputEvent::FilterCutoffMod(v)         => sound.set_filter_cutoff_mod(v),
            OutputEvent::Reverb { wet, dry }        => sound.set_reverb(wet, dry),
            OutputEvent::ShowCursor { x, y, hovering } => cursor.show_cursor(x, y, hovering),
            OutputEvent::HideCursor                 => cursor.hide_cursor(),
            OutputEvent::Pulse { x, y }             => cursor.pulse(x, y),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Surface mapping
// ════════════════════════════════════════════════════════════════════════════

/// Stretch the central `scale` fraction of a normalized coordinate onto the
/// full [0, 1] control surface.
pub fn map_to_surface(v: f64, scale: f64) -> f64 {
    ((v - 0.5) / scale + 0.5).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Log(Vec<String>);

    impl SoundEngine for Log {
        fn note_on(&mut self, a: f64)              { self.0.push(format!("on {a}")); }
        fn note_update(&mut self, x: f64, y: f64)  { self.0.push(format!("upd {x} {y}")); }
        fn note_off(&mut self, r: f64)             { self.0.push(format!("off {r}")); }
        fn set_filter_resonance(&mut self, v: f64) { self.0.push(format!("res {v}")); }
        fn set_filter_cutoff_mod(&mut self, v: f64) { self.0.push(format!("cut {v}")); }
        fn set_reverb(&mut self, w: f64, d: f64)   { self.0.push(format!("rev {w} {d}")); }
    }

    impl CursorView for Log {
        fn show_cursor(&mut self, x: f64, y: f64, h: bool) { self.0.push(format!("cursor {x} {y} {h}")); }
        fn hide_cursor(&mut self)                          { self.0.push("hide".into()); }
        fn pulse(&mut self, x: f64, y: f64)                { self.0.push(format!("pulse {x} {y}")); }
    }

    #[test]
    fn dispatch_routes_in_order() {
        let events = [
            OutputEvent::Pulse { x: 0.5, y: 0.5 },
            OutputEvent::NoteOn { attack: 0.1 },
            OutputEvent::NoteUpdate { x: 0.25, y: 0.75 },
            OutputEvent::Reverb { wet: 0.5, dry: 0.5 },
            OutputEvent::HideCursor,
            OutputEvent::NoteOff { release: 0.2 },
        ];
        let mut sound  = Log::default();
        let mut cursor = Log::default();
        dispatch(&events, &mut sound, &mut cursor);
        assert_eq!(sound.0, ["on 0.1", "upd 0.25 0.75", "rev 0.5 0.5", "off 0.2"]);
        assert_eq!(cursor.0, ["pulse 0.5 0.5", "hide"]);
    }

    #[test]
    fn surface_mapping() {
        assert_eq!(map_to_surface(0.5, 0.8), 0.5);
        assert_eq!(map_to_surface(0.1, 0.8), 0.0);
        assert_eq!(map_to_surface(0.95, 0.8), 1.0);
        assert!((map_to_surface(0.3, 0.8) - 0.25).abs() < 1e-12);
        assert!((map_to_surface(0.3, 1.0) - 0.3).abs() < 1e-12);
    }
}
