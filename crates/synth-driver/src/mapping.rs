//! UIO memory map resolution
//!
//! Each UIO device publishes its first memory region under
//! `<device>/maps/map0/` as three attributes: `addr` and `size` in hex,
//! `offset` in decimal.

use crate::descriptor::{self, Radix};
use crate::error::{Result, SynthError};
use std::path::Path;

/// Mapping subdirectory relative to the device directory
pub const MAP_SUBDIR: &str = "maps/map0";

/// Physical memory window backing a UIO device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MappingRecord {
    /// Physical base address
    pub base_address: u64,

    /// Window size in bytes
    pub size: u64,

    /// Offset passed to `mmap` on the device file
    pub offset: u64,
}

impl MappingRecord {
    /// True when both address and size were resolved to non-zero values
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.base_address > 0 && self.size > 0
    }

    /// Pass the record through if usable
    ///
    /// # Errors
    ///
    /// Returns `SynthError::MappingUnresolved` if the base address or size is zero.
    pub fn validate(self) -> Result<Self> {
        if self.is_usable() {
            Ok(self)
        } else {
            Err(SynthError::MappingUnresolved {
                base_address: self.base_address,
                size: self.size,
            })
        }
    }
}

impl std::fmt::Display for MappingRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Base address: {:#x}, Memory size: {:#x}, Offset: {}",
            self.base_address, self.size, self.offset
        )
    }
}

/// Reads mapping records from sysfs
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingResolver;

impl MappingResolver {
    /// Resolve the `map0` record of the device at `device_directory`
    ///
    /// Fields whose descriptor is missing or unreadable come back as zero;
    /// use [`MappingRecord::validate`] before mapping.
    pub fn resolve(device_directory: &Path) -> MappingRecord {
        let map_dir = device_directory.join(MAP_SUBDIR);
        let field = |name: &str, radix: Radix| {
            descriptor::read_number(&map_dir.join(name), radix).unwrap_or(0)
        };

        let record = MappingRecord {
            base_address: field("addr", Radix::Hex),
            size: field("size", Radix::Hex),
            offset: field("offset", Radix::Decimal),
        };

        tracing::info!("{record}");
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_map(dir: &Path, files: &[(&str, &str)]) {
        let map_dir = dir.join(MAP_SUBDIR);
        std::fs::create_dir_all(&map_dir).unwrap();
        for (name, content) in files {
            std::fs::write(map_dir.join(name), content).unwrap();
        }
    }

    #[test]
    fn test_resolve_complete_record() {
        let dir = TempDir::new().unwrap();
        write_map(
            dir.path(),
            &[("addr", "0x43c00000\n"), ("size", "0x00010000\n"), ("offset", "0\n")],
        );

        let record = MappingResolver::resolve(dir.path());
        assert_eq!(
            record,
            MappingRecord {
                base_address: 0x43c0_0000,
                size: 0x10000,
                offset: 0,
            }
        );
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_partial_record_is_returned() {
        let dir = TempDir::new().unwrap();
        write_map(dir.path(), &[("addr", "0x43c00000\n")]);

        let record = MappingResolver::resolve(dir.path());
        assert_eq!(record.base_address, 0x43c0_0000);
        assert_eq!(record.size, 0);
        assert!(!record.is_usable());
        assert!(matches!(
            record.validate(),
            Err(SynthError::MappingUnresolved { size: 0, .. })
        ));
    }

    #[test]
    fn test_missing_map_directory() {
        let dir = TempDir::new().unwrap();
        assert_eq!(MappingResolver::resolve(dir.path()), MappingRecord::default());
    }

    #[test]
    fn test_zero_address_unusable() {
        let record = MappingRecord {
            base_address: 0,
            size: 0x1000,
            offset: 0,
        };
        assert!(!record.is_usable());
    }
}
