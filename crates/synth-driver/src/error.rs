//! Error types for synthesizer harness operations

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for harness operations
pub type Result<T> = std::result::Result<T, SynthError>;

/// Errors that can occur while locating, mapping or programming the peripheral
#[derive(Debug, Error)]
pub enum SynthError {
    /// No UIO entry declares the requested name
    #[error("No UIO device named {name:?}")]
    DeviceNotFound {
        /// Name that was searched for
        name: String,
    },

    /// sysfs mapping descriptors missing or zero
    #[error("Invalid memory address or size (addr={base_address:#x}, size={size:#x})")]
    MappingUnresolved {
        /// Resolved base address
        base_address: u64,
        /// Resolved size in bytes
        size: u64,
    },

    /// Device special file could not be opened read/write
    #[error("Failed to open device {}: {source}", path.display())]
    DeviceOpenFailed {
        /// Device file path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// mmap rejected by the kernel
    #[error("mmap of {} failed: {reason}", path.display())]
    MapFailed {
        /// Device file path
        path: PathBuf,
        /// Reason for failure
        reason: String,
    },

    /// Descriptor file longer than the bounded read
    #[error("Descriptor {} exceeds {limit} bytes", path.display())]
    DescriptorTooLong {
        /// Descriptor path
        path: PathBuf,
        /// Read bound in bytes
        limit: usize,
    },

    /// Register layout does not fit in the mapped region
    #[error("Register layout needs {required} bytes, mapping has {available}")]
    LayoutExceedsRegion {
        /// Bytes covered by the layout
        required: usize,
        /// Bytes actually mapped
        available: usize,
    },

    /// Register access outside the voice bank
    #[error("Register (voice {voice}, field {field}) out of range")]
    RegisterOutOfRange {
        /// Voice index
        voice: usize,
        /// Field index within the voice block
        field: usize,
    },

    /// Byte access outside the mapped region
    #[error("Out of bounds access: offset={offset:#x}, limit={limit:#x}")]
    OffsetOutOfBounds {
        /// Byte offset requested
        offset: usize,
        /// Mapped size in bytes
        limit: usize,
    },

    /// Value does not fit its register field
    #[error("{field} value {value} does not fit its register field")]
    EncodingOverflow {
        /// Field name
        field: &'static str,
        /// Offending value
        value: u32,
    },

    /// Audio stream could not be configured and the run requires it
    #[error("Audio stream unavailable: {reason}")]
    AudioUnavailable {
        /// Reason for failure
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {source}")]
    Io {
        /// Underlying I/O error
        #[from]
        source: std::io::Error,
    },
}

/// Coarse classification of a [`SynthError`], used for state tracking and exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Device absent
    NotFound,
    /// Mapping record unusable
    MappingUnresolved,
    /// Device file not openable
    DeviceOpenFailed,
    /// mmap rejected
    MapFailed,
    /// Required audio stream missing
    AudioUnavailable,
    /// Layout, encoding or register access problem
    Register,
    /// Filesystem failure outside the mapping path
    Io,
}

impl SynthError {
    /// Create a map failed error
    pub fn map_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MapFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an audio unavailable error
    pub fn audio_unavailable(reason: impl Into<String>) -> Self {
        Self::AudioUnavailable {
            reason: reason.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::DeviceNotFound { .. } => FailureKind::NotFound,
            Self::MappingUnresolved { .. } => FailureKind::MappingUnresolved,
            Self::DeviceOpenFailed { .. } => FailureKind::DeviceOpenFailed,
            Self::MapFailed { .. } => FailureKind::MapFailed,
            Self::AudioUnavailable { .. } => FailureKind::AudioUnavailable,
            Self::LayoutExceedsRegion { .. }
            | Self::RegisterOutOfRange { .. }
            | Self::OffsetOutOfBounds { .. }
            | Self::EncodingOverflow { .. } => FailureKind::Register,
            Self::DescriptorTooLong { .. } | Self::Io { .. } => FailureKind::Io,
        }
    }
}
