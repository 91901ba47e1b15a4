//! Runtime UIO device discovery
//!
//! Scans the UIO class directory (`/sys/class/uio/uio*`) and matches each
//! entry's `name` attribute against the requested device name. Enumeration
//! order is whatever the kernel returns; nothing here sorts.

use crate::descriptor;
use crate::error::{Result, SynthError};
use std::path::{Path, PathBuf};

/// Default UIO class directory
pub const UIO_CLASS_ROOT: &str = "/sys/class/uio";

/// Default directory holding UIO device nodes
pub const DEV_ROOT: &str = "/dev";

/// Device name of the reference synthesizer bitstream
pub const DEFAULT_DEVICE_NAME: &str = "zed_uio_module";

/// A UIO entry whose `name` matched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Hardware-declared name
    pub name: String,

    /// sysfs directory of the entry (`/sys/class/uio/uio0`)
    pub directory: PathBuf,

    /// Entry name, which is also the device node name (`uio0`)
    pub node: String,
}

impl DeviceDescriptor {
    /// Device special file under `dev_root` (`/dev/uio0`)
    #[must_use]
    pub fn device_file(&self, dev_root: &Path) -> PathBuf {
        dev_root.join(&self.node)
    }
}

/// Finds UIO devices by name
#[derive(Debug, Clone)]
pub struct DeviceLocator {
    class_root: PathBuf,
}

impl DeviceLocator {
    /// Locator scanning `class_root` instead of the system UIO directory
    pub fn new(class_root: impl Into<PathBuf>) -> Self {
        Self {
            class_root: class_root.into(),
        }
    }

    /// Directory being scanned
    #[must_use]
    pub fn class_root(&self) -> &Path {
        &self.class_root
    }

    /// Find the first entry whose `name` equals `requested_name`
    ///
    /// Entries without a readable `name` file are skipped.
    ///
    /// # Errors
    ///
    /// Returns `SynthError::DeviceNotFound` if no entry matches, including
    /// when the class directory itself is absent. Any other failure to
    /// enumerate the directory is `SynthError::Io`.
    pub fn locate(&self, requested_name: &str) -> Result<DeviceDescriptor> {
        tracing::debug!(
            "Looking for UIO device {requested_name:?} in {}",
            self.class_root.display()
        );

        let not_found = || SynthError::DeviceNotFound {
            name: requested_name.to_string(),
        };

        let entries = match std::fs::read_dir(&self.class_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No UIO class directory at {}", self.class_root.display());
                return Err(not_found());
            }
            Err(e) => {
                tracing::error!("Cannot enumerate {}: {e}", self.class_root.display());
                return Err(e.into());
            }
        };

        for entry in entries.flatten() {
            let directory = entry.path();

            let name = match descriptor::read_name(&directory.join("name")) {
                Ok(Some(name)) => name,
                Ok(None) => {
                    tracing::debug!("Skipping {}: no readable name", directory.display());
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Skipping {}: {e}", directory.display());
                    continue;
                }
            };

            if name == requested_name {
                let node = entry.file_name().to_string_lossy().into_owned();
                tracing::info!("Device found in {}", directory.display());
                return Ok(DeviceDescriptor {
                    name,
                    directory,
                    node,
                });
            }

            tracing::debug!("{} is {name:?}", directory.display());
        }

        tracing::debug!("No UIO entry named {requested_name:?}");
        Err(not_found())
    }
}

impl Default for DeviceLocator {
    fn default() -> Self {
        Self::new(UIO_CLASS_ROOT)
    }
}
