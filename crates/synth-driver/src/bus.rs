//! Register bus abstraction
//!
//! The voice programmer only needs 32-bit loads and stores into a sized
//! window. [`RegisterBus`] is that window; [`RegionMapper`] is how one is
//! acquired from a device file and mapping record. Releasing the window is
//! tied to `Drop` of the region, so ownership decides when it happens.

use crate::error::Result;
use crate::mapping::MappingRecord;
use std::fmt::Debug;
use std::path::Path;

/// 32-bit register window addressed by byte offset
pub trait RegisterBus: Debug {
    /// Window size in bytes
    fn size(&self) -> usize;

    /// Read the register at `offset`
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is unaligned or the word lies outside the window.
    fn read_u32(&self, offset: usize) -> Result<u32>;

    /// Write the register at `offset`
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is unaligned or the word lies outside the window.
    fn write_u32(&mut self, offset: usize, value: u32) -> Result<()>;
}

/// Acquires register windows
pub trait RegionMapper: Debug {
    /// Mapped window type; dropping it releases the mapping
    type Region: RegisterBus;

    /// Map `record.size` bytes of `device_file` starting at `record.offset`
    ///
    /// # Errors
    ///
    /// Returns an error if the device file can't be opened or the mapping is rejected.
    fn map(&self, device_file: &Path, record: &MappingRecord) -> Result<Self::Region>;
}

/// Check that a 4-byte access at `offset` fits in `size` bytes
pub(crate) fn check_word(offset: usize, size: usize) -> Result<()> {
    let in_bounds = offset % 4 == 0 && offset.checked_add(4).is_some_and(|end| end <= size);
    if in_bounds {
        Ok(())
    } else {
        Err(crate::error::SynthError::OffsetOutOfBounds {
            offset,
            limit: size,
        })
    }
}
