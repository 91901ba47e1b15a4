//! Memory-mapped UIO region
//!
//! Minimal unsafe, all of it in this file:
//! - `mmap` of the device file in [`UioMapping::map`]
//! - volatile 32-bit loads/stores, bounds-checked before use
//! - `munmap` in `Drop`, which runs exactly once per successful map

use crate::bus::{check_word, RegionMapper, RegisterBus};
use crate::error::{Result, SynthError};
use crate::mapping::MappingRecord;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// Shared read/write mapping of a UIO device's memory window
#[derive(Debug)]
pub struct UioMapping {
    ptr: NonNull<u8>,
    size: usize,
    _file: File,
    path: PathBuf,
}

impl UioMapping {
    /// Open `device_file` read/write and map `record.size` bytes at `record.offset`
    ///
    /// The record is not re-validated here; a zero size is rejected by the
    /// kernel and reported as `MapFailed`.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - The device file cannot be opened read/write (`DeviceOpenFailed`)
    /// - The size does not fit the address space or mmap fails (`MapFailed`)
    pub fn map(device_file: &Path, record: &MappingRecord) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(device_file)
            .map_err(|source| SynthError::DeviceOpenFailed {
                path: device_file.to_path_buf(),
                source,
            })?;

        tracing::info!("UIO device {} opened", device_file.display());

        let size = usize::try_from(record.size).map_err(|_| {
            SynthError::map_failed(device_file, format!("size {:#x} exceeds address space", record.size))
        })?;

        // SAFETY: mmap is unsafe but the preconditions hold:
        // - File descriptor is valid (just opened, kept alive in the struct)
        // - PROT_READ|PROT_WRITE with MAP_SHARED so stores reach the device
        // - Kernel rejects size 0 and unaligned offsets; rustix surfaces that as Err
        // - The returned range is unmapped exactly once in Drop
        let addr = unsafe {
            mmap(
                std::ptr::null_mut(),
                size,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                record.offset,
            )
        }
        .map_err(|e| SynthError::map_failed(device_file, e.to_string()))?;

        let ptr = NonNull::new(addr.cast::<u8>())
            .ok_or_else(|| SynthError::map_failed(device_file, "mmap returned null"))?;

        tracing::info!(
            "mmap() success: {size:#x} bytes of {} at {ptr:p}",
            device_file.display()
        );

        Ok(Self {
            ptr,
            size,
            _file: file,
            path: device_file.to_path_buf(),
        })
    }

    /// Device file backing the mapping
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RegisterBus for UioMapping {
    fn size(&self) -> usize {
        self.size
    }

    fn read_u32(&self, offset: usize) -> Result<u32> {
        check_word(offset, self.size)?;

        // SAFETY: Volatile read from the mapped window.
        // - offset is 4-byte aligned and offset + 4 <= size (checked above)
        // - ptr came from a successful mmap of size bytes, which is page aligned
        // - read_volatile keeps the compiler from merging or eliding device reads
        #[allow(clippy::cast_ptr_alignment)]
        let value = unsafe { self.ptr.as_ptr().add(offset).cast::<u32>().read_volatile() };

        tracing::trace!("Read u32 @ {offset:#x} = {value:#x}");
        Ok(value)
    }

    fn write_u32(&mut self, offset: usize, value: u32) -> Result<()> {
        check_word(offset, self.size)?;

        tracing::trace!("Write u32 @ {offset:#x} = {value:#x}");

        // SAFETY: Volatile write to the mapped window.
        // - offset is 4-byte aligned and offset + 4 <= size (checked above)
        // - &mut self gives exclusive access to the mapping
        // - write_volatile keeps every store visible to the peripheral, in order
        #[allow(clippy::cast_ptr_alignment)]
        unsafe {
            self.ptr.as_ptr().add(offset).cast::<u32>().write_volatile(value);
        }

        Ok(())
    }
}

impl Drop for UioMapping {
    fn drop(&mut self) {
        tracing::debug!("Unmapping {:#x} bytes of {}", self.size, self.path.display());

        // SAFETY: munmap requires:
        // - addr returned by mmap, length equal to the mapped length
        // Both hold: ptr and size come straight from map(), and Drop runs once.
        unsafe {
            if let Err(e) = munmap(self.ptr.as_ptr().cast(), self.size) {
                tracing::error!("munmap failed during drop: {e}");
            }
        }
    }
}

// SAFETY: UioMapping owns its mapping exclusively; moving it to another thread
// doesn't invalidate the mapping and there is no thread-local state.
unsafe impl Send for UioMapping {}

/// [`RegionMapper`] backed by real `mmap` of UIO device files
#[derive(Debug, Clone, Copy, Default)]
pub struct UioMapper;

impl RegionMapper for UioMapper {
    type Region = UioMapping;

    fn map(&self, device_file: &Path, record: &MappingRecord) -> Result<UioMapping> {
        UioMapping::map(device_file, record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn backing_file(dir: &TempDir, len: u64) -> PathBuf {
        let path = dir.path().join("uio0");
        let file = File::create(&path).unwrap();
        file.set_len(len).unwrap();
        path
    }

    fn record(size: u64, offset: u64) -> MappingRecord {
        MappingRecord {
            base_address: 0x43c0_0000,
            size,
            offset,
        }
    }

    #[test]
    fn test_writes_reach_backing_file() {
        let dir = TempDir::new().unwrap();
        let path = backing_file(&dir, 0x1000);

        {
            let mut region = UioMapping::map(&path, &record(0x1000, 0)).unwrap();
            assert_eq!(region.size(), 0x1000);
            region.write_u32(8, 0xCAFE_F00D).unwrap();
            assert_eq!(region.read_u32(8).unwrap(), 0xCAFE_F00D);
        }

        let bytes = std::fs::read(&path).unwrap();
        let word = u32::from_ne_bytes(bytes[8..12].try_into().unwrap());
        assert_eq!(word, 0xCAFE_F00D);
    }

    #[test]
    fn test_bounds_checking() {
        let dir = TempDir::new().unwrap();
        let path = backing_file(&dir, 0x1000);
        let mut region = UioMapping::map(&path, &record(0x1000, 0)).unwrap();

        assert!(region.read_u32(0xFFC).is_ok());
        assert!(matches!(
            region.read_u32(0x1000),
            Err(SynthError::OffsetOutOfBounds { .. })
        ));
        assert!(region.write_u32(2, 0).is_err());
        assert!(region.write_u32(usize::MAX - 1, 0).is_err());
    }

    #[test]
    fn test_missing_device_file() {
        let dir = TempDir::new().unwrap();
        let result = UioMapping::map(&dir.path().join("uio9"), &record(0x1000, 0));
        assert!(matches!(result, Err(SynthError::DeviceOpenFailed { .. })));
    }

    #[test]
    fn test_rejected_mapping() {
        let dir = TempDir::new().unwrap();
        let path = backing_file(&dir, 0x1000);

        // Zero length and unaligned offsets are refused by the kernel
        assert!(matches!(
            UioMapping::map(&path, &record(0, 0)),
            Err(SynthError::MapFailed { .. })
        ));
        assert!(matches!(
            UioMapping::map(&path, &record(0x1000, 1)),
            Err(SynthError::MapFailed { .. })
        ));
    }
}
