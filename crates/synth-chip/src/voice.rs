//! Per-voice parameter encodings.
//!
//! ```text
//! envelope word  = (release << 24) | (sustain << 16) | (decay << 8) | attack
//! packed word 0  = (amplitude << 16) | frequency
//! waveform word  = gate[2] | shape[1:0]
//! ```

use crate::regs::waveform::{GATE, SHAPE_MASK};

/// Sustain level used by the reference test pattern.
pub const DEFAULT_SUSTAIN: u8 = 0x80;

/// Frequency (Hz) written by the untuned test pattern.
pub const DEFAULT_FREQUENCY_HZ: u32 = 2;

// ── Envelope ─────────────────────────────────────────────────────────────────

/// ADSR envelope, one byte per stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Envelope {
    /// Attack duration.
    pub attack: u8,
    /// Decay duration.
    pub decay: u8,
    /// Sustain level.
    pub sustain: u8,
    /// Release duration.
    pub release: u8,
}

impl Envelope {
    /// Envelope of the reference pattern: A, D and R step through `voice % 4`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn for_voice(voice: usize, sustain: u8) -> Self {
        let step = (voice % 4) as u8;
        Self {
            attack: step,
            decay: step,
            sustain,
            release: step,
        }
    }

    /// Pack into the envelope register word.
    #[must_use]
    pub const fn pack(self) -> u32 {
        (self.release as u32) << 24
            | (self.sustain as u32) << 16
            | (self.decay as u32) << 8
            | self.attack as u32
    }

    /// Decode an envelope register word.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn unpack(word: u32) -> Self {
        Self {
            attack: word as u8,
            decay: (word >> 8) as u8,
            sustain: (word >> 16) as u8,
            release: (word >> 24) as u8,
        }
    }
}

// ── Amplitude ────────────────────────────────────────────────────────────────

/// Q8.8 fixed-point gain; [`Amplitude::UNITY`] is full scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Amplitude(pub u16);

impl Amplitude {
    /// Unity gain.
    pub const UNITY: Self = Self(0x100);

    /// Divisor from raw register value to gain.
    pub const SCALE: f32 = 256.0;

    /// Raw register value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Human-readable gain.
    #[must_use]
    pub fn gain(self) -> f32 {
        f32::from(self.0) / Self::SCALE
    }
}

impl Default for Amplitude {
    fn default() -> Self {
        Self::UNITY
    }
}

// ── Waveform ─────────────────────────────────────────────────────────────────

/// Wave shape selector, always in `0..=2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct WaveShape(u8);

impl WaveShape {
    /// Number of shapes the oscillator implements.
    pub const COUNT: u8 = 3;

    /// Shape `index`, or `None` when the oscillator has no such shape.
    #[must_use]
    pub const fn new(index: u8) -> Option<Self> {
        if index < Self::COUNT {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Selector index.
    #[must_use]
    pub const fn index(self) -> u8 {
        self.0
    }

    /// Waveform register word with the gate clear.
    #[must_use]
    pub const fn word(self) -> u32 {
        self.0 as u32 & SHAPE_MASK
    }
}

/// Rule assigning a wave shape to each voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WaveAssignment {
    /// `voice % 3`: neighbouring voices cycle through the shapes.
    #[default]
    Modulo3,
    /// `(voice / 7) % 3`: bands of seven voices share a shape.
    Bands7,
}

impl WaveAssignment {
    /// Shape for `voice`.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn shape_for(self, voice: usize) -> WaveShape {
        let index = match self {
            Self::Modulo3 => voice % 3,
            Self::Bands7 => (voice / 7) % 3,
        };
        WaveShape(index as u8)
    }
}

// ── Word helpers ─────────────────────────────────────────────────────────────

/// Packed-layout word 0.
#[must_use]
pub const fn packed_freq_amp(frequency: u16, amplitude: Amplitude) -> u32 {
    (amplitude.0 as u32) << 16 | frequency as u32
}

/// Waveform word with the gate set; all other bits unchanged.
#[must_use]
pub const fn gate_on(word: u32) -> u32 {
    word | GATE
}

/// Waveform word with the gate cleared; all other bits unchanged.
#[must_use]
pub const fn gate_off(word: u32) -> u32 {
    word & !GATE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_field_order() {
        let env = Envelope {
            attack: 2,
            decay: 1,
            sustain: 0x40,
            release: 3,
        };
        assert_eq!(env.pack(), 0x0340_0102);
        assert_eq!(Envelope::unpack(0x0340_0102), env);
    }

    #[test]
    fn reference_envelope_steps() {
        assert_eq!(Envelope::for_voice(0, DEFAULT_SUSTAIN).pack(), 0x0080_0000);
        assert_eq!(Envelope::for_voice(5, DEFAULT_SUSTAIN).pack(), 0x0180_0101);
        assert_eq!(Envelope::for_voice(7, DEFAULT_SUSTAIN).pack(), 0x0380_0303);
    }

    #[test]
    fn unity_amplitude_reads_as_one() {
        assert!((Amplitude::UNITY.gain() - 1.0).abs() < f32::EPSILON);
        assert!((Amplitude(0x80).gain() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn packed_word_layout() {
        assert_eq!(packed_freq_amp(2, Amplitude::UNITY), 0x0100_0002);
        assert_eq!(packed_freq_amp(261, Amplitude(0x80)), 0x0080_0105);
    }

    #[test]
    fn gate_toggle_preserves_other_bits() {
        for word in [0u32, 1, 2, 0xFFFF_FFFB, 0xDEAD_BEEF, 0x4] {
            assert_eq!(gate_off(gate_on(word)), word & !GATE);
            assert_eq!(gate_on(word) & !GATE, word & !GATE);
            assert_eq!(gate_on(word) & GATE, GATE);
        }
    }

    #[test]
    fn wave_assignments() {
        assert_eq!(WaveAssignment::Modulo3.shape_for(4).index(), 1);
        assert_eq!(WaveAssignment::Bands7.shape_for(6).index(), 0);
        assert_eq!(WaveAssignment::Bands7.shape_for(7).index(), 1);
        assert_eq!(WaveAssignment::Bands7.shape_for(21).index(), 0);
        assert!(WaveShape::new(3).is_none());
        assert_eq!(WaveShape::new(2).map(WaveShape::word), Some(2));
    }
}
