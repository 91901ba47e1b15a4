//! Voice register block layout.
//!
//! The peripheral exposes a bank of identical voices. Each voice owns
//! `num_addr_per_unit` consecutive 32-bit registers:
//!
//! ```text
//! word  packed layout (3 words)          split layout (4 words)
//! ────  ───────────────────────────────  ───────────────────────────────
//!  0    amp[31:16] | freq[15:0]          freq[31:0]
//!  1    gate[2] | shape[1:0]             gate[2] | shape[1:0]
//!  2    R[31:24] S[23:16] D[15:8] A[7:0] R[31:24] S[23:16] D[15:8] A[7:0]
//!  3    -                                amp[15:0]
//! ```
//!
//! Voice `n` starts at byte offset `n * num_addr_per_unit * 4`.

/// Size of one register in bytes.
pub const WORD_BYTES: usize = 4;

/// Voice count of the reference bitstream.
pub const DEFAULT_NUM_UNITS: usize = 32;

// ── Field indices within a voice block ───────────────────────────────────────

/// Word indices inside one voice block.
pub mod field {
    /// Frequency word (packed layout: amplitude in the upper half).
    pub const FREQ_AMP: usize = 0;
    /// Waveform selector and gate bit.
    pub const WAVEFORM: usize = 1;
    /// Packed ADSR envelope.
    pub const ENVELOPE: usize = 2;
    /// Separate amplitude word (split layout only).
    pub const AMPLITUDE: usize = 3;
}

// ── Waveform word bit definitions ────────────────────────────────────────────

/// Waveform word bits.
pub mod waveform {
    /// Wave shape selector, bits 1:0.
    pub const SHAPE_MASK: u32 = 0b11;
    /// Gate / trigger flag. Set starts the envelope, clear releases it.
    pub const GATE: u32 = 1 << 2;
}

/// How the voice parameters are spread across the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceFormat {
    /// Three words; amplitude shares word 0 with a 16-bit frequency.
    #[default]
    Packed,
    /// Four words; full-width frequency in word 0, amplitude in word 3.
    Split,
}

impl VoiceFormat {
    /// Registers written per voice in this format.
    #[must_use]
    pub const fn words(self) -> usize {
        match self {
            Self::Packed => 3,
            Self::Split => 4,
        }
    }
}

/// Geometry of the voice bank inside the mapped region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterLayout {
    /// Number of voices.
    pub num_units: usize,
    /// 32-bit registers per voice.
    pub num_addr_per_unit: usize,
}

impl RegisterLayout {
    /// Layout with `num_units` voices and the stride of `format`.
    #[must_use]
    pub const fn new(num_units: usize, format: VoiceFormat) -> Self {
        Self {
            num_units,
            num_addr_per_unit: format.words(),
        }
    }

    /// Total registers covered by the layout, or `None` if the count
    /// does not fit in `usize`.
    #[must_use]
    pub const fn word_count(&self) -> Option<usize> {
        self.num_units.checked_mul(self.num_addr_per_unit)
    }

    /// Bytes covered by the layout, or `None` on overflow.
    #[must_use]
    pub const fn byte_len(&self) -> Option<usize> {
        match self.word_count() {
            Some(words) => words.checked_mul(WORD_BYTES),
            None => None,
        }
    }

    /// Flat register index of `(voice, field)`, or `None` when either is out of range.
    #[must_use]
    pub const fn word_index(&self, voice: usize, field: usize) -> Option<usize> {
        if voice >= self.num_units || field >= self.num_addr_per_unit {
            return None;
        }
        match voice.checked_mul(self.num_addr_per_unit) {
            Some(base) => base.checked_add(field),
            None => None,
        }
    }

    /// Byte offset of `(voice, field)` from the start of the region.
    #[must_use]
    pub const fn byte_offset(&self, voice: usize, field: usize) -> Option<usize> {
        match self.word_index(voice, field) {
            Some(index) => index.checked_mul(WORD_BYTES),
            None => None,
        }
    }
}

impl Default for RegisterLayout {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_UNITS, VoiceFormat::Packed)
    }
}
