//! Channel-message encoding and value scaling.

// ════════════════════════════════════════════════════════════════════════════
// Controller numbers
// ════════════════════════════════════════════════════════════════════════════

pub const CC_DATA_ENTRY_MSB: u8 = 6;
pub const CC_VOLUME:         u8 = 7;
pub const CC_EXPRESSION:     u8 = 11;
pub const CC_DATA_ENTRY_LSB: u8 = 38;
pub const CC_RESONANCE:      u8 = 71;
pub const CC_RELEASE:        u8 = 72;
pub const CC_ATTACK:         u8 = 73;
pub const CC_CUTOFF:         u8 = 74;
pub const CC_REVERB_SEND:    u8 = 91;
pub const CC_RPN_LSB:        u8 = 100;
pub const CC_RPN_MSB:        u8 = 101;
pub const CC_ALL_SOUND_OFF:  u8 = 120;
pub const CC_ALL_NOTES_OFF:  u8 = 123;

/// Pitch-bend value for "no bend".
pub const BEND_CENTER: u16 = 8192;
pub const BEND_MAX:    u16 = 16383;

// ════════════════════════════════════════════════════════════════════════════
// Messages
// ════════════════════════════════════════════════════════════════════════════

pub fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | (channel & 0x0F), note & 0x7F, velocity & 0x7F]
}

pub fn note_off(channel: u8, note: u8) -> [u8; 3] {
    [0x80 | (channel & 0x0F), note & 0x7F, 0]
}

pub fn control_change(channel: u8, controller: u8, value: u8) -> [u8; 3] {
    [0xB0 | (channel & 0x0F), controller & 0x7F, value & 0x7F]
}

pub fn program_change(channel: u8, program: u8) -> [u8; 2] {
    [0xC0 | (channel & 0x0F), program & 0x7F]
}

/// 14-bit pitch bend, LSB first on the wire.
pub fn pitch_bend(channel: u8, value: u16) -> [u8; 3] {
    let v = value.min(BEND_MAX);
    [0xE0 | (channel & 0x0F), (v & 0x7F) as u8, ((v >> 7) & 0x7F) as u8]
}

/// RPN 0 (pitch-bend sensitivity) followed by the null RPN.
pub fn bend_range(channel: u8, semitones: u8) -> [[u8; 3]; 6] {
    [
        control_change(channel, CC_RPN_MSB, 0),
        control_change(channel, CC_RPN_LSB, 0),
        control_change(channel, CC_DATA_ENTRY_MSB, semitones),
        control_change(channel, CC_DATA_ENTRY_LSB, 0),
        control_change(channel, CC_RPN_MSB, 127),
        control_change(channel, CC_RPN_LSB, 127),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// Scaling
// ════════════════════════════════════════════════════════════════════════════

/// Shortest and longest envelope time a controller value can express (s).
pub const TIME_MIN: f64 = 0.001;
pub const TIME_MAX: f64 = 4.0;

/// [0, 1] → 0..=127.
pub fn unit_to_7bit(v: f64) -> u8 {
    if !v.is_finite() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 127.0).round() as u8
}

/// [0, 1] → 0..=16383, 0.5 landing on the bend center.
pub fn unit_to_bend(v: f64) -> u16 {
    if !v.is_finite() {
        return BEND_CENTER;
    }
    (v.clamp(0.0, 1.0) * BEND_MAX as f64).round() as u16
}

/// Envelope time (s) → controller value, log-spaced over
/// [`TIME_MIN`]‥[`TIME_MAX`].
pub fn time_to_cc(secs: f64) -> u8 {
    if !secs.is_finite() || secs <= TIME_MIN {
        return 0;
    }
    let t = (secs / TIME_MIN).ln() / (TIME_MAX / TIME_MIN).ln();
    unit_to_7bit(t)
}

/// Inverse of [`time_to_cc`], up to quantization.
pub fn cc_to_time(value: u8) -> f64 {
    let t = value.min(127) as f64 / 127.0;
    TIME_MIN * (TIME_MAX / TIME_MIN).powf(t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bytes_carry_channel() {
        assert_eq!(note_on(3, 60, 100), [0x93, 60, 100]);
        assert_eq!(note_off(15, 60), [0x8F, 60, 0]);
        assert_eq!(control_change(0, CC_CUTOFF, 64), [0xB0, 74, 64]);
        assert_eq!(program_change(1, 81), [0xC1, 81]);
    }

    #[test]
    fn pitch_bend_splits_fourteen_bits() {
        assert_eq!(pitch_bend(0, BEND_CENTER), [0xE0, 0x00, 0x40]);
        assert_eq!(pitch_bend(0, BEND_MAX), [0xE0, 0x7F, 0x7F]);
        assert_eq!(pitch_bend(0, u16::MAX), [0xE0, 0x7F, 0x7F]);
    }

    #[test]
    fn unit_scaling_clamps() {
        assert_eq!(unit_to_7bit(-1.0), 0);
        assert_eq!(unit_to_7bit(0.5), 64);
        assert_eq!(unit_to_7bit(2.0), 127);
        assert_eq!(unit_to_7bit(f64::NAN), 0);
        assert_eq!(unit_to_bend(0.5), BEND_CENTER);
        assert_eq!(unit_to_bend(1.0), BEND_MAX);
    }

    #[test]
    fn time_mapping_is_logarithmic() {
        assert_eq!(time_to_cc(0.0), 0);
        assert_eq!(time_to_cc(TIME_MIN), 0);
        assert_eq!(time_to_cc(TIME_MAX), 127);
        assert_eq!(time_to_cc(100.0), 127);
        // Geometric midpoint sits mid-scale.
        let mid = (TIME_MIN * TIME_MAX).sqrt();
        assert!((63..=64).contains(&time_to_cc(mid)));
        assert!(time_to_cc(0.02) < time_to_cc(0.6));
    }

    #[test]
    fn time_mapping_round_trips_within_a_step() {
        for secs in [0.003, 0.02, 0.15, 0.6, 1.2] {
            let back = cc_to_time(time_to_cc(secs));
            // One step is a factor of 4000^(1/127) ≈ 1.067.
            assert!((back / secs).ln().abs() < 0.07, "{secs} → {back}");
        }
    }

    #[test]
    fn bend_range_is_rpn_zero() {
        let msgs = bend_range(0, 24);
        assert_eq!(msgs[0], [0xB0, 101, 0]);
        assert_eq!(msgs[1], [0xB0, 100, 0]);
        assert_eq!(msgs[2], [0xB0, 6, 24]);
        assert_eq!(msgs[5], [0xB0, 100, 127]);
    }
}
