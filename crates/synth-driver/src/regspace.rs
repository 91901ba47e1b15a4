//! Voice-indexed view over a mapped register window
//!
//! [`RegisterSpace`] owns the window for as long as the test runs and
//! translates `(voice, field)` pairs into byte offsets using a single
//! [`RegisterLayout`]. Anything outside the layout is rejected before it
//! reaches the bus.

use crate::bus::RegisterBus;
use crate::error::{Result, SynthError};
use synth_chip::regs::{RegisterLayout, WORD_BYTES};

/// Register window partitioned into equal voice blocks
#[derive(Debug)]
pub struct RegisterSpace<B: RegisterBus> {
    bus: B,
    layout: RegisterLayout,
    words: usize,
}

impl<B: RegisterBus> RegisterSpace<B> {
    /// Take ownership of `bus` and partition it according to `layout`
    ///
    /// # Errors
    ///
    /// Returns `SynthError::LayoutExceedsRegion` if the layout does not fit in
    /// the window, including layouts too large to measure (reported with
    /// `required == usize::MAX`). The window is released in that case.
    pub fn new(bus: B, layout: RegisterLayout) -> Result<Self> {
        let available = bus.size();
        let required = match layout.byte_len() {
            Some(len) if len <= available => len,
            len => {
                return Err(SynthError::LayoutExceedsRegion {
                    required: len.unwrap_or(usize::MAX),
                    available,
                })
            }
        };

        tracing::debug!(
            "Register space: {} units × {} words ({} of {} bytes)",
            layout.num_units,
            layout.num_addr_per_unit,
            required,
            available
        );

        Ok(Self {
            bus,
            layout,
            words: required / WORD_BYTES,
        })
    }

    /// Layout in use
    #[must_use]
    pub const fn layout(&self) -> &RegisterLayout {
        &self.layout
    }

    /// Number of voices
    #[must_use]
    pub const fn num_units(&self) -> usize {
        self.layout.num_units
    }

    /// Registers covered by the layout
    #[must_use]
    pub const fn word_count(&self) -> usize {
        self.words
    }

    fn offset(&self, voice: usize, field: usize) -> Result<usize> {
        self.layout
            .byte_offset(voice, field)
            .ok_or(SynthError::RegisterOutOfRange { voice, field })
    }

    /// Read one field of one voice
    ///
    /// # Errors
    ///
    /// Returns `SynthError::RegisterOutOfRange` for indices outside the layout.
    pub fn read(&self, voice: usize, field: usize) -> Result<u32> {
        let offset = self.offset(voice, field)?;
        self.bus.read_u32(offset)
    }

    /// Write one field of one voice
    ///
    /// # Errors
    ///
    /// Returns `SynthError::RegisterOutOfRange` for indices outside the layout.
    pub fn write(&mut self, voice: usize, field: usize, value: u32) -> Result<()> {
        let offset = self.offset(voice, field)?;
        self.bus.write_u32(offset, value)
    }

    /// Read-modify-write one field; returns the value written
    ///
    /// # Errors
    ///
    /// Returns `SynthError::RegisterOutOfRange` for indices outside the layout.
    pub fn modify(&mut self, voice: usize, field: usize, f: impl FnOnce(u32) -> u32) -> Result<u32> {
        let offset = self.offset(voice, field)?;
        let value = f(self.bus.read_u32(offset)?);
        self.bus.write_u32(offset, value)?;
        Ok(value)
    }

    /// Read register `index` counting from the start of the layout
    ///
    /// # Errors
    ///
    /// Returns `SynthError::RegisterOutOfRange` past the last register of the layout.
    pub fn read_word(&self, index: usize) -> Result<u32> {
        if index >= self.words {
            let stride = self.layout.num_addr_per_unit.max(1);
            return Err(SynthError::RegisterOutOfRange {
                voice: index / stride,
                field: index % stride,
            });
        }
        self.bus.read_u32(index * WORD_BYTES)
    }

    /// Release the view and hand back the window
    pub fn into_inner(self) -> B {
        self.bus
    }
}
