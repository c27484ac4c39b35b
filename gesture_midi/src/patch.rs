//! The handful of General MIDI programs that suit a continuous, bent voice.

/// General MIDI programs (0-indexed, as sent in Program Change).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum Patch {
    Violin        = 40,
    VoiceOohs     = 53,
    #[default]
    Lead1Square   = 80,
    Lead2Sawtooth = 81,
    Lead6Voice    = 85,
    Pad2Warm      = 89,
    Pad5Bowed     = 92,
    Pad7Halo      = 94,
}

impl Patch {
    pub const ALL: [Patch; 8] = [
        Patch::Lead1Square,
        Patch::Lead2Sawtooth,
        Patch::Lead6Voice,
        Patch::Violin,
        Patch::VoiceOohs,
        Patch::Pad2Warm,
        Patch::Pad5Bowed,
        Patch::Pad7Halo,
    ];

    /// Raw MIDI program number (0–127).
    pub fn program(self) -> u8 { self as u8 }

    pub fn name(self) -> &'static str {
        match self {
            Patch::Violin        => "Violin",
            Patch::VoiceOohs     => "Voice Oohs",
            Patch::Lead1Square   => "Lead 1 (square)",
            Patch::Lead2Sawtooth => "Lead 2 (sawtooth)",
            Patch::Lead6Voice    => "Lead 6 (voice)",
            Patch::Pad2Warm      => "Pad 2 (warm)",
            Patch::Pad5Bowed     => "Pad 5 (bowed)",
            Patch::Pad7Halo      => "Pad 7 (halo)",
        }
    }

    /// Next patch in [`Patch::ALL`], wrapping.
    pub fn next(self) -> Patch {
        let i = Self::ALL.iter().position(|&p| p == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_numbers() {
        assert_eq!(Patch::Violin.program(), 40);
        assert_eq!(Patch::Lead1Square.program(), 80);
        assert_eq!(Patch::Pad7Halo.program(), 94);
    }

    #[test]
    fn next_cycles_through_all() {
        let mut p = Patch::default();
        for _ in 0..Patch::ALL.len() {
            p = p.next();
        }
        assert_eq!(p, Patch::default());
        assert_eq!(Patch::Pad7Halo.next(), Patch::Lead1Square);
    }
}
