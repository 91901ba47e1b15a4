//! Voice programming and read-back
//!
//! Write order per voice is fixed: word 0, waveform, envelope, then the
//! separate amplitude word in the split format. The gate bit is never set
//! here; triggering belongs to the orchestrator once every voice is committed.

use crate::bus::RegisterBus;
use crate::error::{Result, SynthError};
use crate::regspace::RegisterSpace;
use synth_chip::regs::{field, VoiceFormat, WORD_BYTES};
use synth_chip::tuning;
use synth_chip::voice::{
    gate_off, gate_on, packed_freq_amp, Amplitude, Envelope, WaveAssignment, WaveShape,
    DEFAULT_FREQUENCY_HZ, DEFAULT_SUSTAIN,
};

/// Source of each voice's frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrequencyMode {
    /// Same frequency in Hz for every voice
    Fixed(u32),
    /// Equal-temperament scale from A4 = 440 Hz, one step per voice
    Tuned,
}

impl Default for FrequencyMode {
    fn default() -> Self {
        Self::Fixed(DEFAULT_FREQUENCY_HZ)
    }
}

/// Rules turning a voice index into register values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoicePlan {
    /// Register format of each voice block
    pub format: VoiceFormat,
    /// Frequency rule
    pub frequency: FrequencyMode,
    /// Amplitude written to every voice
    pub amplitude: Amplitude,
    /// Sustain level written to every voice
    pub sustain: u8,
    /// Wave shape rule
    pub waves: WaveAssignment,
}

impl Default for VoicePlan {
    fn default() -> Self {
        Self {
            format: VoiceFormat::Packed,
            frequency: FrequencyMode::default(),
            amplitude: Amplitude::UNITY,
            sustain: DEFAULT_SUSTAIN,
            waves: WaveAssignment::Modulo3,
        }
    }
}

impl VoicePlan {
    /// Parameters for `voice`
    #[must_use]
    pub fn settings(&self, voice: usize) -> VoiceSettings {
        let frequency = match self.frequency {
            FrequencyMode::Fixed(hz) => hz,
            FrequencyMode::Tuned => tuning::voice_frequency(voice),
        };

        VoiceSettings {
            voice,
            frequency,
            amplitude: self.amplitude,
            shape: self.waves.shape_for(voice),
            envelope: Envelope::for_voice(voice, self.sustain),
        }
    }
}

/// Decoded parameters of one voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceSettings {
    /// Voice index
    pub voice: usize,
    /// Frequency in Hz
    pub frequency: u32,
    /// Output gain
    pub amplitude: Amplitude,
    /// Wave shape
    pub shape: WaveShape,
    /// ADSR envelope
    pub envelope: Envelope,
}

impl VoiceSettings {
    /// `(field, value)` pairs in write order
    ///
    /// # Errors
    ///
    /// Returns `SynthError::EncodingOverflow` if the frequency doesn't fit the
    /// 16-bit field of the packed format.
    pub fn encode(&self, format: VoiceFormat) -> Result<Vec<(usize, u32)>> {
        let words = match format {
            VoiceFormat::Packed => {
                let frequency =
                    u16::try_from(self.frequency).map_err(|_| SynthError::EncodingOverflow {
                        field: "frequency",
                        value: self.frequency,
                    })?;
                vec![
                    (field::FREQ_AMP, packed_freq_amp(frequency, self.amplitude)),
                    (field::WAVEFORM, self.shape.word()),
                    (field::ENVELOPE, self.envelope.pack()),
                ]
            }
            VoiceFormat::Split => vec![
                (field::FREQ_AMP, self.frequency),
                (field::WAVEFORM, self.shape.word()),
                (field::ENVELOPE, self.envelope.pack()),
                (field::AMPLITUDE, u32::from(self.amplitude.raw())),
            ],
        };
        Ok(words)
    }
}

/// Result of one programming pass
#[derive(Debug, Clone)]
pub struct ProgramSummary {
    /// Settings written, one per voice
    pub voices: Vec<VoiceSettings>,
    /// Value written to each register of the layout; `None` where nothing was written
    pub expected: Vec<Option<u32>>,
}

/// One register as read back
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadbackWord {
    /// Byte offset in the region
    pub offset: usize,
    /// Value read
    pub value: u32,
}

/// Register whose read-back differs from what was written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    /// Voice index
    pub voice: usize,
    /// Field index within the voice block
    pub field: usize,
    /// Value written
    pub expected: u32,
    /// Value read
    pub actual: u32,
}

/// Outcome of the read-back pass; informational only
#[derive(Debug, Clone, Default)]
pub struct ReadbackReport {
    /// Every register of the layout, in order
    pub words: Vec<ReadbackWord>,
    /// Registers that did not read back as written
    pub mismatches: Vec<Mismatch>,
}

impl ReadbackReport {
    /// True when every written register read back unchanged
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Writes a [`VoicePlan`] into a [`RegisterSpace`]
#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceProgrammer {
    plan: VoicePlan,
}

impl VoiceProgrammer {
    /// Programmer for `plan`
    #[must_use]
    pub const fn new(plan: VoicePlan) -> Self {
        Self { plan }
    }

    /// Plan in use
    #[must_use]
    pub const fn plan(&self) -> &VoicePlan {
        &self.plan
    }

    /// Program one voice, gate left clear
    ///
    /// # Errors
    ///
    /// Returns an error if the voice is outside the layout or a value overflows its field.
    pub fn program_voice<B: RegisterBus>(
        &self,
        space: &mut RegisterSpace<B>,
        voice: usize,
    ) -> Result<VoiceSettings> {
        let settings = self.plan.settings(voice);
        let words = settings.encode(self.plan.format)?;

        tracing::info!(
            "Writing(unit{voice}): {}[Hz] and {:.2}",
            settings.frequency,
            settings.amplitude.gain()
        );
        tracing::info!(
            "A: {}, D: {}, S: {}, R: {}",
            settings.envelope.attack,
            settings.envelope.decay,
            settings.envelope.sustain,
            settings.envelope.release
        );

        for (field, value) in words {
            space.write(voice, field, value)?;
        }

        Ok(settings)
    }

    /// Program every voice of the layout
    ///
    /// # Errors
    ///
    /// Returns `SynthError::RegisterOutOfRange` up front if the layout stride is
    /// narrower than the plan's format, otherwise the first write error.
    pub fn program_all<B: RegisterBus>(
        &self,
        space: &mut RegisterSpace<B>,
    ) -> Result<ProgramSummary> {
        let layout = *space.layout();
        let words_needed = self.plan.format.words();
        if layout.num_addr_per_unit < words_needed {
            return Err(SynthError::RegisterOutOfRange {
                voice: 0,
                field: words_needed - 1,
            });
        }

        let mut expected = vec![None; space.word_count()];
        let mut voices = Vec::with_capacity(layout.num_units);

        for voice in 0..layout.num_units {
            let settings = self.program_voice(space, voice)?;
            for (field, value) in settings.encode(self.plan.format)? {
                if let Some(index) = layout.word_index(voice, field) {
                    expected[index] = Some(value);
                }
            }
            voices.push(settings);
        }

        Ok(ProgramSummary { voices, expected })
    }

    /// Read every register of the layout and compare against `summary`
    ///
    /// Mismatches are logged and collected, never turned into errors.
    ///
    /// # Errors
    ///
    /// Returns an error only if a register cannot be read at all.
    pub fn read_back<B: RegisterBus>(
        space: &RegisterSpace<B>,
        summary: &ProgramSummary,
    ) -> Result<ReadbackReport> {
        let layout = *space.layout();
        let mut report = ReadbackReport::default();

        for index in 0..space.word_count() {
            let value = space.read_word(index)?;
            let offset = index * WORD_BYTES;
            tracing::info!("Data read({offset:#x}): {value:#x}");
            report.words.push(ReadbackWord { offset, value });

            if let Some(Some(expected)) = summary.expected.get(index) {
                if *expected != value {
                    let mismatch = Mismatch {
                        voice: index / layout.num_addr_per_unit,
                        field: index % layout.num_addr_per_unit,
                        expected: *expected,
                        actual: value,
                    };
                    tracing::warn!(
                        "Read-back mismatch at unit{} field {}: wrote {:#x}, read {:#x}",
                        mismatch.voice,
                        mismatch.field,
                        mismatch.expected,
                        mismatch.actual
                    );
                    report.mismatches.push(mismatch);
                }
            }
        }

        Ok(report)
    }

    /// Set or clear the gate bit of `voice`; returns the new waveform word
    ///
    /// # Errors
    ///
    /// Returns `SynthError::RegisterOutOfRange` if `voice` is outside the layout.
    pub fn set_gate<B: RegisterBus>(
        space: &mut RegisterSpace<B>,
        voice: usize,
        on: bool,
    ) -> Result<u32> {
        let update = if on { gate_on } else { gate_off };
        space.modify(voice, field::WAVEFORM, update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::check_word;
    use synth_chip::regs::{waveform::GATE, RegisterLayout};

    #[derive(Debug)]
    struct MemoryBus {
        words: Vec<u32>,
        stuck_bits: u32,
    }

    impl MemoryBus {
        fn new(len: usize) -> Self {
            Self {
                words: vec![0; len],
                stuck_bits: 0,
            }
        }
    }

    impl RegisterBus for MemoryBus {
        fn size(&self) -> usize {
            self.words.len() * WORD_BYTES
        }

        fn read_u32(&self, offset: usize) -> Result<u32> {
            check_word(offset, self.size())?;
            Ok(self.words[offset / WORD_BYTES] | self.stuck_bits)
        }

        fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
            check_word(offset, self.size())?;
            self.words[offset / WORD_BYTES] = value;
            Ok(())
        }
    }

    fn space(units: usize, format: VoiceFormat) -> RegisterSpace<MemoryBus> {
        let layout = RegisterLayout::new(units, format);
        RegisterSpace::new(MemoryBus::new(units * format.words()), layout).unwrap()
    }

    #[test]
    fn test_packed_voice_words() {
        let mut space = space(32, VoiceFormat::Packed);
        let programmer = VoiceProgrammer::default();
        programmer.program_all(&mut space).unwrap();

        // unit 5: wave 2, ADR = 1
        assert_eq!(space.read(5, field::FREQ_AMP).unwrap(), 0x0100_0002);
        assert_eq!(space.read(5, field::WAVEFORM).unwrap(), 2);
        assert_eq!(space.read(5, field::ENVELOPE).unwrap(), 0x0180_0101);
    }

    #[test]
    fn test_gate_never_set_while_programming() {
        let mut space = space(32, VoiceFormat::Packed);
        VoiceProgrammer::default().program_all(&mut space).unwrap();

        for voice in 0..32 {
            assert_eq!(space.read(voice, field::WAVEFORM).unwrap() & GATE, 0);
        }
    }

    #[test]
    fn test_split_format_amplitude_word() {
        let mut space = space(8, VoiceFormat::Split);
        let plan = VoicePlan {
            format: VoiceFormat::Split,
            frequency: FrequencyMode::Tuned,
            amplitude: Amplitude(0x80),
            ..VoicePlan::default()
        };
        VoiceProgrammer::new(plan).program_all(&mut space).unwrap();

        assert_eq!(space.read(0, field::FREQ_AMP).unwrap(), 261);
        assert_eq!(space.read(0, field::AMPLITUDE).unwrap(), 0x80);
        assert_eq!(space.read(5, field::FREQ_AMP).unwrap(), 440);
    }

    #[test]
    fn test_split_plan_needs_wide_layout() {
        let mut space = space(4, VoiceFormat::Packed);
        let plan = VoicePlan {
            format: VoiceFormat::Split,
            ..VoicePlan::default()
        };
        let result = VoiceProgrammer::new(plan).program_all(&mut space);
        assert!(matches!(result, Err(SynthError::RegisterOutOfRange { .. })));
        // Nothing written
        assert!(space.into_inner().words.iter().all(|w| *w == 0));
    }

    #[test]
    fn test_packed_frequency_overflow() {
        let settings = VoicePlan {
            frequency: FrequencyMode::Fixed(70_000),
            ..VoicePlan::default()
        }
        .settings(0);

        assert!(matches!(
            settings.encode(VoiceFormat::Packed),
            Err(SynthError::EncodingOverflow { value: 70_000, .. })
        ));
        assert!(settings.encode(VoiceFormat::Split).is_ok());
    }

    #[test]
    fn test_readback_clean() {
        let mut space = space(4, VoiceFormat::Packed);
        let summary = VoiceProgrammer::default().program_all(&mut space).unwrap();
        let report = VoiceProgrammer::read_back(&space, &summary).unwrap();

        assert_eq!(report.words.len(), 12);
        assert_eq!(report.words[3].offset, 12);
        assert!(report.is_clean());
    }

    #[test]
    fn test_readback_mismatch_is_reported_not_fatal() {
        let layout = RegisterLayout::new(2, VoiceFormat::Packed);
        let mut bus = MemoryBus::new(6);
        bus.stuck_bits = 0x8000_0000;
        let mut space = RegisterSpace::new(bus, layout).unwrap();

        let summary = VoiceProgrammer::default().program_all(&mut space).unwrap();
        let report = VoiceProgrammer::read_back(&space, &summary).unwrap();

        assert_eq!(report.mismatches.len(), 6);
        assert_eq!(
            report.mismatches[0],
            Mismatch {
                voice: 0,
                field: 0,
                expected: 0x0100_0002,
                actual: 0x8100_0002,
            }
        );
    }

    #[test]
    fn test_gate_toggle_preserves_shape() {
        let mut space = space(3, VoiceFormat::Packed);
        VoiceProgrammer::default().program_all(&mut space).unwrap();

        let on = VoiceProgrammer::set_gate(&mut space, 2, true).unwrap();
        assert_eq!(on, 2 | GATE);
        let off = VoiceProgrammer::set_gate(&mut space, 2, false).unwrap();
        assert_eq!(off, 2);
        assert_eq!(space.read(1, field::WAVEFORM).unwrap(), 1);
    }
}
