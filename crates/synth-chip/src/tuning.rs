//! Equal-temperament tuning for the musically-tuned voice plan.
//!
//! Voice frequencies are `440 × 2^(n/12)` truncated to whole hertz, where `n`
//! is the voice's semitone offset from A4.

/// Reference pitch (A4) in hertz.
pub const REFERENCE_HZ: f64 = 440.0;

/// Semitone offsets from A4 for one octave of a C major scale (C4 … B4).
///
/// Voices past the end of the table repeat it one octave higher per pass.
pub const SEMITONE_TABLE: [i32; 7] = [-9, -7, -5, -4, -2, 0, 2];

/// Frequency in whole hertz for a semitone offset from A4 (truncating).
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn tuned_frequency(semitones: i32) -> u32 {
    let hz = REFERENCE_HZ * 2f64.powf(f64::from(semitones) / 12.0);
    hz as u32
}

/// Semitone offset assigned to `voice`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const fn semitone_offset(voice: usize) -> i32 {
    let len = SEMITONE_TABLE.len();
    SEMITONE_TABLE[voice % len] + 12 * (voice / len) as i32
}

/// Tuned frequency for `voice`.
#[must_use]
pub fn voice_frequency(voice: usize) -> u32 {
    tuned_frequency(semitone_offset(voice))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c_truncates_to_261() {
        // 440 × 2^(-9/12) = 261.63
        assert_eq!(tuned_frequency(-9), 261);
    }

    #[test]
    fn octaves_double() {
        assert_eq!(tuned_frequency(0), 440);
        assert_eq!(tuned_frequency(12), 880);
        assert_eq!(tuned_frequency(-12), 220);
    }

    #[test]
    fn table_wraps_an_octave_up() {
        assert_eq!(semitone_offset(0), -9);
        assert_eq!(semitone_offset(7), 3);
        assert_eq!(voice_frequency(7), 523);
        // 32 voices stay inside the 16-bit packed frequency field
        assert!(voice_frequency(31) < u32::from(u16::MAX));
    }
}
